//! Owner set and threshold policy
//!
//! Holds a locally cached copy of the vault's owner set and approval
//! threshold, validates mutation requests against it, and hands back
//! unsigned candidate actions for the sign-and-admit pipeline. The
//! `propose_*` methods never mutate; the `apply_*` counterparts update
//! the cache after an action was admitted by the external ledger, and
//! are the only mutation path. Invariant: `1 <= threshold <= |owners|`
//! and the owner set is never empty.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::encode::CallData;
use crate::core::{Action, Address};

// =============================================================================
// Function signatures
// =============================================================================

/// Add an owner, optionally moving the threshold
pub const FN_ADD_OWNER: &str = "addOwnerWithThreshold(address,uint256)";
/// Remove an owner and set the post-removal threshold
pub const FN_REMOVE_OWNER: &str = "removeOwner(address,uint256)";
/// Replace one owner with another, threshold unchanged
pub const FN_SWAP_OWNER: &str = "swapOwner(address,address)";
/// Move the threshold
pub const FN_CHANGE_THRESHOLD: &str = "changeThreshold(uint256)";

// =============================================================================
// Error Types
// =============================================================================

/// Precondition violations on policy mutation requests
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Already an owner: {0}")]
    AlreadyOwner(Address),
    #[error("Not an owner: {0}")]
    NotAnOwner(Address),
    #[error("Threshold {requested} unreachable with {owners} owner(s)")]
    ThresholdUnreachable { requested: usize, owners: usize },
    #[error("Invalid owner address: {0}")]
    InvalidOwner(Address),
    #[error("Duplicate owner in initial set: {0}")]
    DuplicateOwner(Address),
}

// =============================================================================
// QuorumPolicy
// =============================================================================

/// Cached owner/threshold state of one vault
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    /// The vault the policy describes
    vault: Address,
    /// Authorized owner identities, unique, never empty
    owners: Vec<Address>,
    /// Minimum approvals required to admit an action
    threshold: usize,
}

impl QuorumPolicy {
    /// Create a policy, validating the initial owner set and threshold
    pub fn new(
        vault: Address,
        owners: Vec<Address>,
        threshold: usize,
    ) -> Result<Self, PolicyError> {
        if threshold < 1 || threshold > owners.len() {
            return Err(PolicyError::ThresholdUnreachable {
                requested: threshold,
                owners: owners.len(),
            });
        }
        for (i, owner) in owners.iter().enumerate() {
            if owner.is_zero() {
                return Err(PolicyError::InvalidOwner(*owner));
            }
            if owners[..i].contains(owner) {
                return Err(PolicyError::DuplicateOwner(*owner));
            }
        }
        Ok(Self {
            vault,
            owners,
            threshold,
        })
    }

    /// The vault this policy describes
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// Current owner identities
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Current approval threshold
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether an identity is a current owner
    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    /// Human-readable quorum description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    // -------------------------------------------------------------------------
    // Candidate builders
    // -------------------------------------------------------------------------

    /// Candidate action adding `new_owner`
    ///
    /// An omitted threshold preserves the current value.
    pub fn propose_add_owner(
        &self,
        new_owner: Address,
        new_threshold: Option<usize>,
        nonce: u64,
    ) -> Result<Action, PolicyError> {
        let threshold = self.check_add_owner(new_owner, new_threshold)?;
        let payload = CallData::new(FN_ADD_OWNER)
            .address(&new_owner)
            .uint(&U256::from(threshold))
            .finish();
        Ok(Action::vault_call(self.vault, payload, nonce))
    }

    /// Candidate action removing `owner`, moving the threshold to
    /// `new_threshold`
    ///
    /// Removing the last owner is always rejected.
    pub fn propose_remove_owner(
        &self,
        owner: Address,
        new_threshold: usize,
        nonce: u64,
    ) -> Result<Action, PolicyError> {
        self.check_remove_owner(owner, new_threshold)?;
        let payload = CallData::new(FN_REMOVE_OWNER)
            .address(&owner)
            .uint(&U256::from(new_threshold))
            .finish();
        Ok(Action::vault_call(self.vault, payload, nonce))
    }

    /// Candidate action replacing `old` with `new`, threshold unchanged
    pub fn propose_swap_owner(
        &self,
        old: Address,
        new: Address,
        nonce: u64,
    ) -> Result<Action, PolicyError> {
        self.check_swap_owner(old, new)?;
        let payload = CallData::new(FN_SWAP_OWNER)
            .address(&old)
            .address(&new)
            .finish();
        Ok(Action::vault_call(self.vault, payload, nonce))
    }

    /// Candidate action moving the threshold to `new_threshold`
    pub fn propose_change_threshold(
        &self,
        new_threshold: usize,
        nonce: u64,
    ) -> Result<Action, PolicyError> {
        self.check_change_threshold(new_threshold)?;
        let payload = CallData::new(FN_CHANGE_THRESHOLD)
            .uint(&U256::from(new_threshold))
            .finish();
        Ok(Action::vault_call(self.vault, payload, nonce))
    }

    // -------------------------------------------------------------------------
    // Cache application after admission
    // -------------------------------------------------------------------------

    /// Apply an admitted add-owner mutation to the cache
    pub fn apply_add_owner(
        &mut self,
        new_owner: Address,
        new_threshold: Option<usize>,
    ) -> Result<(), PolicyError> {
        let threshold = self.check_add_owner(new_owner, new_threshold)?;
        self.owners.push(new_owner);
        self.threshold = threshold;
        Ok(())
    }

    /// Apply an admitted remove-owner mutation to the cache
    pub fn apply_remove_owner(
        &mut self,
        owner: Address,
        new_threshold: usize,
    ) -> Result<(), PolicyError> {
        self.check_remove_owner(owner, new_threshold)?;
        self.owners.retain(|o| *o != owner);
        self.threshold = new_threshold;
        Ok(())
    }

    /// Apply an admitted swap-owner mutation to the cache
    pub fn apply_swap_owner(&mut self, old: Address, new: Address) -> Result<(), PolicyError> {
        self.check_swap_owner(old, new)?;
        for owner in &mut self.owners {
            if *owner == old {
                *owner = new;
            }
        }
        Ok(())
    }

    /// Apply an admitted threshold change to the cache
    pub fn apply_change_threshold(&mut self, new_threshold: usize) -> Result<(), PolicyError> {
        self.check_change_threshold(new_threshold)?;
        self.threshold = new_threshold;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Precondition checks
    // -------------------------------------------------------------------------

    fn check_add_owner(
        &self,
        new_owner: Address,
        new_threshold: Option<usize>,
    ) -> Result<usize, PolicyError> {
        if new_owner.is_zero() {
            return Err(PolicyError::InvalidOwner(new_owner));
        }
        if self.is_owner(&new_owner) {
            return Err(PolicyError::AlreadyOwner(new_owner));
        }
        let threshold = new_threshold.unwrap_or(self.threshold);
        let owners_after = self.owners.len() + 1;
        if threshold < 1 || threshold > owners_after {
            return Err(PolicyError::ThresholdUnreachable {
                requested: threshold,
                owners: owners_after,
            });
        }
        Ok(threshold)
    }

    fn check_remove_owner(&self, owner: Address, new_threshold: usize) -> Result<(), PolicyError> {
        if !self.is_owner(&owner) {
            return Err(PolicyError::NotAnOwner(owner));
        }
        let owners_after = self.owners.len() - 1;
        if new_threshold < 1 || new_threshold > owners_after {
            return Err(PolicyError::ThresholdUnreachable {
                requested: new_threshold,
                owners: owners_after,
            });
        }
        Ok(())
    }

    fn check_swap_owner(&self, old: Address, new: Address) -> Result<(), PolicyError> {
        if new.is_zero() {
            return Err(PolicyError::InvalidOwner(new));
        }
        if !self.is_owner(&old) {
            return Err(PolicyError::NotAnOwner(old));
        }
        if self.is_owner(&new) {
            return Err(PolicyError::AlreadyOwner(new));
        }
        Ok(())
    }

    fn check_change_threshold(&self, new_threshold: usize) -> Result<(), PolicyError> {
        if new_threshold < 1 || new_threshold > self.owners.len() {
            return Err(PolicyError::ThresholdUnreachable {
                requested: new_threshold,
                owners: self.owners.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::selector;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn vault() -> Address {
        addr(0xAA)
    }

    fn policy_2_of_3() -> QuorumPolicy {
        QuorumPolicy::new(vault(), vec![addr(1), addr(2), addr(3)], 2).unwrap()
    }

    #[test]
    fn test_new_validates_initial_state() {
        assert!(QuorumPolicy::new(vault(), vec![addr(1)], 1).is_ok());
        assert_eq!(
            QuorumPolicy::new(vault(), vec![addr(1)], 0),
            Err(PolicyError::ThresholdUnreachable { requested: 0, owners: 1 })
        );
        assert_eq!(
            QuorumPolicy::new(vault(), vec![addr(1)], 2),
            Err(PolicyError::ThresholdUnreachable { requested: 2, owners: 1 })
        );
        assert_eq!(
            QuorumPolicy::new(vault(), vec![addr(1), addr(1)], 1),
            Err(PolicyError::DuplicateOwner(addr(1)))
        );
        assert_eq!(
            QuorumPolicy::new(vault(), vec![], 1),
            Err(PolicyError::ThresholdUnreachable { requested: 1, owners: 0 })
        );
    }

    #[test]
    fn test_propose_add_owner_candidate_shape() {
        let policy = policy_2_of_3();
        let action = policy.propose_add_owner(addr(4), Some(3), 11).unwrap();

        assert_eq!(action.to, vault());
        assert_eq!(action.nonce, 11);
        assert_eq!(action.payload_selector(), Some(selector(FN_ADD_OWNER)));
        // Candidate building never mutates
        assert_eq!(policy.owners().len(), 3);
        assert_eq!(policy.threshold(), 2);
    }

    #[test]
    fn test_propose_add_existing_owner_rejected() {
        let policy = policy_2_of_3();
        assert_eq!(
            policy.propose_add_owner(addr(2), None, 0),
            Err(PolicyError::AlreadyOwner(addr(2)))
        );
    }

    #[test]
    fn test_omitted_threshold_preserves_current() {
        let mut policy = policy_2_of_3();
        policy.apply_add_owner(addr(4), None).unwrap();
        assert_eq!(policy.threshold(), 2);
        assert_eq!(policy.owners().len(), 4);
    }

    #[test]
    fn test_remove_sole_owner_rejected() {
        // Scenario: owner set of size 1 can never shrink to empty
        let policy = QuorumPolicy::new(vault(), vec![addr(1)], 1).unwrap();
        assert_eq!(
            policy.propose_remove_owner(addr(1), 1, 0),
            Err(PolicyError::ThresholdUnreachable { requested: 1, owners: 0 })
        );
    }

    #[test]
    fn test_remove_owner_threshold_bounds() {
        let policy = policy_2_of_3();
        assert_eq!(
            policy.propose_remove_owner(addr(1), 3, 0),
            Err(PolicyError::ThresholdUnreachable { requested: 3, owners: 2 })
        );
        assert_eq!(
            policy.propose_remove_owner(addr(1), 0, 0),
            Err(PolicyError::ThresholdUnreachable { requested: 0, owners: 2 })
        );
        assert!(policy.propose_remove_owner(addr(1), 2, 0).is_ok());
    }

    #[test]
    fn test_remove_unknown_owner_rejected() {
        let policy = policy_2_of_3();
        assert_eq!(
            policy.propose_remove_owner(addr(9), 1, 0),
            Err(PolicyError::NotAnOwner(addr(9)))
        );
    }

    #[test]
    fn test_swap_owner_preconditions() {
        let policy = policy_2_of_3();
        assert!(policy.propose_swap_owner(addr(1), addr(4), 0).is_ok());
        assert_eq!(
            policy.propose_swap_owner(addr(9), addr(4), 0),
            Err(PolicyError::NotAnOwner(addr(9)))
        );
        assert_eq!(
            policy.propose_swap_owner(addr(1), addr(2), 0),
            Err(PolicyError::AlreadyOwner(addr(2)))
        );
        assert_eq!(
            policy.propose_swap_owner(addr(1), Address::ZERO, 0),
            Err(PolicyError::InvalidOwner(Address::ZERO))
        );
    }

    #[test]
    fn test_change_threshold_bounds() {
        // Scenario: both 0 and n+1 are unreachable for n owners
        let policy = policy_2_of_3();
        assert_eq!(
            policy.propose_change_threshold(0, 0),
            Err(PolicyError::ThresholdUnreachable { requested: 0, owners: 3 })
        );
        assert_eq!(
            policy.propose_change_threshold(4, 0),
            Err(PolicyError::ThresholdUnreachable { requested: 4, owners: 3 })
        );
        assert!(policy.propose_change_threshold(3, 0).is_ok());
    }

    #[test]
    fn test_invariant_holds_under_mutation_sequences() {
        // No admitted sequence may break 1 <= threshold <= |owners| != 0
        let mut policy = policy_2_of_3();

        policy.apply_add_owner(addr(4), Some(4)).unwrap();
        policy.apply_remove_owner(addr(4), 3).unwrap();
        policy.apply_swap_owner(addr(3), addr(5)).unwrap();
        policy.apply_change_threshold(1).unwrap();
        policy.apply_remove_owner(addr(5), 2).unwrap();
        policy.apply_remove_owner(addr(2), 1).unwrap();

        assert!(policy.threshold() >= 1);
        assert!(policy.threshold() <= policy.owners().len());
        assert!(!policy.owners().is_empty());

        // The sole remaining owner cannot be removed
        let last = policy.owners()[0];
        assert!(policy.apply_remove_owner(last, 1).is_err());
        assert_eq!(policy.owners().len(), 1);
    }

    #[test]
    fn test_apply_swap_keeps_owner_count() {
        let mut policy = policy_2_of_3();
        policy.apply_swap_owner(addr(2), addr(7)).unwrap();
        assert_eq!(policy.owners().len(), 3);
        assert!(policy.is_owner(&addr(7)));
        assert!(!policy.is_owner(&addr(2)));
    }

    #[test]
    fn test_description() {
        assert_eq!(policy_2_of_3().description(), "2-of-3");
    }
}
