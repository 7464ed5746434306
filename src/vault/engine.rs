//! Engine orchestration
//!
//! [`VaultEngine`] ties the pipeline together: it holds the signing
//! domain, a cached copy of the owner/threshold policy and extension
//! state, and the transfer ledger model. Candidate actions flow through
//! digest derivation and quorum verification before the encoded action
//! and signature blob are handed to the submission collaborator. The
//! authoritative state lives behind the external ledger; after admitting
//! a mutation the cache is stale until the caller refreshes it.

use chrono::{DateTime, Duration, Utc};
use log::info;
use primitive_types::U256;
use thiserror::Error;

use crate::authority::{ProposalId, TransferError, TransferLedger};
use crate::core::{Action, ActionError, Address, Digest, Domain};
use crate::extensions::{ExtensionError, ExtensionRegistry, ModuleCursor};
use crate::quorum::{AuthError, PolicyError, QuorumPolicy, SignatureSet};
use crate::vault::client::{ActionSubmitter, Receipt, SubmitError, VaultReader};

/// Engine-level error taxonomy
///
/// Everything except [`EngineError::Submission`] is a local,
/// non-retryable rejection of the request.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Extension(#[from] ExtensionError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Submission(#[from] SubmitError),
}

/// Client-side engine for one vault
#[derive(Clone, Debug)]
pub struct VaultEngine {
    domain: Domain,
    policy: QuorumPolicy,
    extensions: ExtensionRegistry,
    transfers: TransferLedger,
    nonce: u64,
    stale: bool,
}

impl VaultEngine {
    /// Create an engine over a freshly initialized vault
    pub fn new(
        domain: Domain,
        owners: Vec<Address>,
        threshold: usize,
        super_admin: Address,
    ) -> Result<Self, EngineError> {
        let vault = domain.vault;
        Ok(Self {
            domain,
            policy: QuorumPolicy::new(vault, owners, threshold)?,
            extensions: ExtensionRegistry::new(vault),
            transfers: TransferLedger::new(super_admin),
            nonce: 0,
            stale: false,
        })
    }

    /// Build an engine from the external read path
    pub fn from_reader(domain: Domain, reader: &impl VaultReader) -> Result<Self, EngineError> {
        let super_admin = reader.super_admin();
        let mut engine = Self::new(domain, reader.owners(), reader.threshold(), super_admin)?;
        engine.load_extensions(reader)?;
        engine.nonce = reader.action_nonce();
        Ok(engine)
    }

    /// Re-read the cached policy and extension state
    ///
    /// Callers invoke this after admitting a mutation; the engine never
    /// silently serves a cache it knows it invalidated.
    pub fn refresh(&mut self, reader: &impl VaultReader) -> Result<(), EngineError> {
        self.policy = QuorumPolicy::new(self.domain.vault, reader.owners(), reader.threshold())?;
        self.extensions = ExtensionRegistry::new(self.domain.vault);
        self.load_extensions(reader)?;
        self.nonce = reader.action_nonce();
        self.stale = false;
        Ok(())
    }

    fn load_extensions(&mut self, reader: &impl VaultReader) -> Result<(), EngineError> {
        let mut cursor = ModuleCursor::START;
        loop {
            let (page, next) = reader.modules(cursor, 32);
            for module in page {
                self.extensions.apply_enable_module(module)?;
            }
            if next == ModuleCursor::START {
                break;
            }
            cursor = next;
        }
        self.extensions.apply_set_guard(reader.guard());
        self.extensions.apply_set_fallback_handler(reader.fallback_handler());
        Ok(())
    }

    /// The signing domain
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Cached owner/threshold policy
    pub fn policy(&self) -> &QuorumPolicy {
        &self.policy
    }

    /// Cached extension state
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// The transfer ledger model
    pub fn transfers(&self) -> &TransferLedger {
        &self.transfers
    }

    /// Replay nonce the next candidate action will carry
    pub fn next_nonce(&self) -> u64 {
        self.nonce
    }

    /// True once an admitted mutation invalidated the cache
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Digest committing `action` to this vault's domain
    pub fn digest_for(&self, action: &Action) -> Digest {
        self.domain.derive(action)
    }

    // -------------------------------------------------------------------------
    // Candidate builders
    // -------------------------------------------------------------------------

    /// Candidate value transfer out of the vault
    pub fn propose_transfer(&self, to: Address, value: U256) -> Result<Action, EngineError> {
        Ok(Action::transfer(to, value, self.nonce)?)
    }

    /// Candidate owner addition
    pub fn propose_add_owner(
        &self,
        new_owner: Address,
        new_threshold: Option<usize>,
    ) -> Result<Action, EngineError> {
        Ok(self.policy.propose_add_owner(new_owner, new_threshold, self.nonce)?)
    }

    /// Candidate owner removal
    pub fn propose_remove_owner(
        &self,
        owner: Address,
        new_threshold: usize,
    ) -> Result<Action, EngineError> {
        Ok(self.policy.propose_remove_owner(owner, new_threshold, self.nonce)?)
    }

    /// Candidate owner swap
    pub fn propose_swap_owner(&self, old: Address, new: Address) -> Result<Action, EngineError> {
        Ok(self.policy.propose_swap_owner(old, new, self.nonce)?)
    }

    /// Candidate threshold change
    pub fn propose_change_threshold(&self, new_threshold: usize) -> Result<Action, EngineError> {
        Ok(self.policy.propose_change_threshold(new_threshold, self.nonce)?)
    }

    /// Candidate module enable
    pub fn propose_enable_module(&self, module: Address) -> Result<Action, EngineError> {
        Ok(self.extensions.propose_enable_module(module, self.nonce)?)
    }

    /// Candidate module disable
    pub fn propose_disable_module(
        &self,
        cursor: ModuleCursor,
        module: Address,
    ) -> Result<Action, EngineError> {
        Ok(self.extensions.propose_disable_module(cursor, module, self.nonce)?)
    }

    /// Candidate guard change
    pub fn propose_set_guard(&self, guard: Option<Address>) -> Action {
        self.extensions.propose_set_guard(guard, self.nonce)
    }

    /// Candidate fallback-handler change
    pub fn propose_set_fallback_handler(&self, handler: Option<Address>) -> Action {
        self.extensions.propose_set_fallback_handler(handler, self.nonce)
    }

    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------

    /// Verify a signed candidate and hand it to the submission
    /// collaborator
    ///
    /// Verification is local and pure; the submit call is the atomic
    /// admit-or-reject boundary. On acceptance the local cache is marked
    /// stale and the replay nonce advances.
    pub fn admit(
        &mut self,
        action: &Action,
        signatures: &SignatureSet,
        submitter: &mut impl ActionSubmitter,
    ) -> Result<Receipt, EngineError> {
        let encoded = action.encode()?;
        let digest = self.domain.derive(action);
        signatures.verify(&digest, self.policy.owners(), self.policy.threshold())?;

        let receipt = submitter.submit(&encoded, &signatures.concat(), self.domain.vault)?;
        self.nonce = self.nonce.max(action.nonce + 1);
        self.stale = true;
        info!(
            "action {} admitted for vault {} ({})",
            digest,
            self.domain.vault,
            self.policy.description()
        );
        Ok(receipt)
    }

    // -------------------------------------------------------------------------
    // Authority transfer
    // -------------------------------------------------------------------------

    /// Propose a super-administrator transfer
    pub fn propose_admin_transfer(
        &mut self,
        by: Address,
        successor: Address,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> Result<ProposalId, EngineError> {
        Ok(self.transfers.propose(by, successor, timeout, now)?)
    }

    /// Confirm a super-administrator transfer
    pub fn confirm_admin_transfer(
        &mut self,
        by: Address,
        id: ProposalId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        Ok(self.transfers.confirm(by, id, now)?)
    }

    /// Cancel a super-administrator transfer
    pub fn cancel_admin_transfer(&mut self, by: Address, id: ProposalId) -> Result<(), EngineError> {
        Ok(self.transfers.cancel(by, id)?)
    }
}
