//! Vault engine orchestration
//!
//! Ties the authorization pipeline together: capability traits for the
//! external ledger, the engine that drives digest derivation, quorum
//! verification and submission, batch-relay assembly, and typed event
//! decoding.

pub mod batch;
pub mod client;
pub mod engine;
pub mod events;

pub use batch::{Batch, BatchError, BatchItem, FN_BATCH};
pub use client::{ActionSubmitter, DigestSigner, LocalVault, Receipt, SubmitError, VaultReader};
pub use engine::{EngineError, VaultEngine};
pub use events::{event_topic, VaultEvent};
