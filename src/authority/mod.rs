//! Super-administrator transfer authority
//!
//! The super-administrator role is reassigned through a timed,
//! cancellable two-phase proposal ledger, independent of the
//! signature-quorum path.

pub mod transfer;

pub use transfer::{ProposalId, TransferError, TransferLedger, TransferProposal};
