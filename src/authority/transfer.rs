//! Timed super-administrator transfer ledger
//!
//! Reassignment of the super-administrator role runs through a delayed,
//! cancellable two-phase proposal rather than the signature-quorum path:
//! propose, then confirm before the timeout, or cancel at any time prior
//! to confirmation. Proposal ids are a monotonic per-vault counter and
//! are never reused. Expiry is a derived predicate over a caller-supplied
//! clock; no background task ever fires.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::Address;

/// Identifier of a transfer proposal
pub type ProposalId = u64;

/// Errors from the transfer state machine
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransferError {
    #[error("Unauthorized: {0} does not hold the super-administrator role")]
    Unauthorized(Address),
    #[error("Invalid timeout: must be greater than zero")]
    InvalidTimeout,
    #[error("Invalid successor: {0}")]
    InvalidSuccessor(Address),
    #[error("Proposal not found or no longer active: {0}")]
    ProposalNotFound(ProposalId),
    #[error("Proposal expired: {0}")]
    Expired(ProposalId),
}

/// A single transfer proposal lifecycle instance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferProposal {
    /// Monotonic proposal id
    pub id: ProposalId,
    /// Super-administrator at proposal time
    pub admin: Address,
    /// Proposed successor
    pub successor: Address,
    /// Creation timestamp
    pub proposed_at: DateTime<Utc>,
    /// Confirmation window measured from `proposed_at`
    pub timeout: Duration,
    /// Cleared on confirm or cancel; expiry leaves it set
    pub active: bool,
}

impl TransferProposal {
    /// Derived expiry predicate: strictly past the confirmation window
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.proposed_at + self.timeout
    }
}

/// The propose/confirm/cancel state machine for one vault
///
/// Check and mutation happen inside a single `&mut self` call; no
/// intermediate state is observable where a check passed but the role
/// swap has not happened.
#[derive(Clone, Debug)]
pub struct TransferLedger {
    /// Current holder of the super-administrator role
    super_admin: Address,
    /// Next proposal id; never reused, including across cancellations
    next_id: ProposalId,
    /// All proposals ever created, keyed by id
    proposals: HashMap<ProposalId, TransferProposal>,
}

impl TransferLedger {
    /// Create a ledger with the initial super-administrator
    pub fn new(super_admin: Address) -> Self {
        Self {
            super_admin,
            next_id: 1,
            proposals: HashMap::new(),
        }
    }

    /// Current holder of the super-administrator role
    pub fn super_admin(&self) -> Address {
        self.super_admin
    }

    /// The id the next proposal will receive
    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    /// Look up a proposal by id
    pub fn proposal(&self, id: ProposalId) -> Option<&TransferProposal> {
        self.proposals.get(&id)
    }

    /// Propose transferring the role to `successor`
    ///
    /// Only the current super-administrator may propose; the timeout must
    /// be non-zero and the successor must be a real, distinct identity.
    pub fn propose(
        &mut self,
        by: Address,
        successor: Address,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> Result<ProposalId, TransferError> {
        if by != self.super_admin {
            return Err(TransferError::Unauthorized(by));
        }
        if timeout <= Duration::zero() {
            return Err(TransferError::InvalidTimeout);
        }
        if successor.is_zero() || successor == self.super_admin {
            return Err(TransferError::InvalidSuccessor(successor));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.proposals.insert(
            id,
            TransferProposal {
                id,
                admin: by,
                successor,
                proposed_at: now,
                timeout,
                active: true,
            },
        );
        info!(
            "transfer proposal {} created: {} -> {}, window {}s",
            id,
            by,
            successor,
            timeout.num_seconds()
        );
        Ok(id)
    }

    /// Confirm a proposal, reassigning the role to its successor
    ///
    /// Requires an active, unexpired proposal whose recorded admin still
    /// holds the role, confirmed by that same identity; a proposal left
    /// behind by a superseded administrator can never confirm. Exactly
    /// one confirmation may succeed per lifecycle instance.
    pub fn confirm(
        &mut self,
        by: Address,
        id: ProposalId,
        now: DateTime<Utc>,
    ) -> Result<(), TransferError> {
        let super_admin = self.super_admin;
        let proposal = self
            .proposals
            .get_mut(&id)
            .filter(|p| p.active)
            .ok_or(TransferError::ProposalNotFound(id))?;

        if proposal.is_expired(now) {
            return Err(TransferError::Expired(id));
        }
        if by != super_admin || proposal.admin != super_admin {
            return Err(TransferError::Unauthorized(by));
        }

        // Checks passed: clear and swap in one step
        proposal.active = false;
        let successor = proposal.successor;
        self.super_admin = successor;
        info!("transfer proposal {id} confirmed: super-admin is now {successor}");
        Ok(())
    }

    /// Cancel a proposal, clearing its active flag
    ///
    /// Permitted to the live super-administrator at any time before
    /// confirmation; an expired-but-active record may still be cancelled
    /// as cleanup.
    pub fn cancel(&mut self, by: Address, id: ProposalId) -> Result<(), TransferError> {
        let super_admin = self.super_admin;
        let proposal = self
            .proposals
            .get_mut(&id)
            .filter(|p| p.active)
            .ok_or(TransferError::ProposalNotFound(id))?;

        if by != super_admin {
            return Err(TransferError::Unauthorized(by));
        }

        proposal.active = false;
        debug!("transfer proposal {id} cancelled");
        Ok(())
    }

    /// Whether a proposal is active and still inside its window
    pub fn is_valid(&self, id: ProposalId, now: DateTime<Utc>) -> bool {
        self.proposals
            .get(&id)
            .map(|p| p.active && !p.is_expired(now))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn admin() -> Address {
        addr(0xAD)
    }

    fn successor() -> Address {
        addr(0x5C)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn hour() -> Duration {
        Duration::seconds(3600)
    }

    #[test]
    fn test_propose_requires_role() {
        let mut ledger = TransferLedger::new(admin());
        assert_eq!(
            ledger.propose(addr(0x01), successor(), hour(), t0()),
            Err(TransferError::Unauthorized(addr(0x01)))
        );
    }

    #[test]
    fn test_propose_rejects_zero_timeout() {
        let mut ledger = TransferLedger::new(admin());
        assert_eq!(
            ledger.propose(admin(), successor(), Duration::zero(), t0()),
            Err(TransferError::InvalidTimeout)
        );
    }

    #[test]
    fn test_propose_rejects_bad_successor() {
        let mut ledger = TransferLedger::new(admin());
        assert_eq!(
            ledger.propose(admin(), Address::ZERO, hour(), t0()),
            Err(TransferError::InvalidSuccessor(Address::ZERO))
        );
        assert_eq!(
            ledger.propose(admin(), admin(), hour(), t0()),
            Err(TransferError::InvalidSuccessor(admin()))
        );
    }

    #[test]
    fn test_confirm_before_timeout() {
        let mut ledger = TransferLedger::new(admin());
        let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();

        assert!(ledger.is_valid(id, t0() + Duration::seconds(10)));
        ledger.confirm(admin(), id, t0() + Duration::seconds(10)).unwrap();
        assert_eq!(ledger.super_admin(), successor());
        assert!(!ledger.is_valid(id, t0() + Duration::seconds(11)));
    }

    #[test]
    fn test_confirm_at_exact_deadline_succeeds() {
        let mut ledger = TransferLedger::new(admin());
        let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();
        ledger.confirm(admin(), id, t0() + hour()).unwrap();
        assert_eq!(ledger.super_admin(), successor());
    }

    #[test]
    fn test_expiry_and_cancel_interplay() {
        // Scenario: timeout 3600, confirm at +3601 fails, cancel at the
        // same timestamp succeeds
        let mut ledger = TransferLedger::new(admin());
        let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();

        let late = t0() + Duration::seconds(3601);
        assert_eq!(ledger.confirm(admin(), id, late), Err(TransferError::Expired(id)));
        assert_eq!(ledger.super_admin(), admin());

        ledger.cancel(admin(), id).unwrap();
        assert_eq!(
            ledger.confirm(admin(), id, late),
            Err(TransferError::ProposalNotFound(id))
        );
    }

    #[test]
    fn test_double_confirm_fails_second_time() {
        let mut ledger = TransferLedger::new(admin());
        let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();

        let now = t0() + Duration::seconds(1);
        ledger.confirm(admin(), id, now).unwrap();
        assert_eq!(
            ledger.confirm(admin(), id, now),
            Err(TransferError::ProposalNotFound(id))
        );
    }

    #[test]
    fn test_stale_proposal_cannot_confirm_after_role_change() {
        // Proposal left behind by a superseded admin must never confirm
        let mut ledger = TransferLedger::new(admin());
        let stale = ledger.propose(admin(), addr(0x77), hour(), t0()).unwrap();
        let live = ledger.propose(admin(), successor(), hour(), t0()).unwrap();

        ledger.confirm(admin(), live, t0() + Duration::seconds(5)).unwrap();
        assert_eq!(ledger.super_admin(), successor());

        // Neither the old admin nor the new one can confirm the stale record
        assert_eq!(
            ledger.confirm(admin(), stale, t0() + Duration::seconds(6)),
            Err(TransferError::Unauthorized(admin()))
        );
        assert_eq!(
            ledger.confirm(successor(), stale, t0() + Duration::seconds(6)),
            Err(TransferError::Unauthorized(successor()))
        );

        // The live admin cleans it up instead
        ledger.cancel(successor(), stale).unwrap();
    }

    #[test]
    fn test_cancel_requires_live_role() {
        let mut ledger = TransferLedger::new(admin());
        let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();
        assert_eq!(
            ledger.cancel(addr(0x01), id),
            Err(TransferError::Unauthorized(addr(0x01)))
        );
    }

    #[test]
    fn test_ids_strictly_increase_across_cancellations() {
        let mut ledger = TransferLedger::new(admin());
        let mut last = 0;
        for _ in 0..5 {
            let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();
            assert!(id > last);
            ledger.cancel(admin(), id).unwrap();
            last = id;
        }
        assert_eq!(ledger.next_id(), 6);
    }

    #[test]
    fn test_unknown_id() {
        let mut ledger = TransferLedger::new(admin());
        assert_eq!(
            ledger.confirm(admin(), 42, t0()),
            Err(TransferError::ProposalNotFound(42))
        );
        assert_eq!(ledger.cancel(admin(), 42), Err(TransferError::ProposalNotFound(42)));
        assert!(!ledger.is_valid(42, t0()));
    }

    #[test]
    fn test_proposal_lookup() {
        let mut ledger = TransferLedger::new(admin());
        let id = ledger.propose(admin(), successor(), hour(), t0()).unwrap();
        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.admin, admin());
        assert_eq!(proposal.successor, successor());
        assert_eq!(proposal.proposed_at, t0());
        assert!(proposal.active);
    }
}
