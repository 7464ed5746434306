//! Vault-Engine: a client-side engine for multi-party vault accounts
//!
//! This crate provides the authorization machinery for a vault governed
//! by an owner set and an approval threshold:
//! - Canonical action encoding and deterministic digest derivation
//! - Recoverable ECDSA signature collection and quorum verification
//! - Owner/threshold policy mutations as quorum-admitted actions
//! - Delegated module, guard, and fallback-handler management
//! - A timed, cancellable super-administrator transfer ledger
//! - Batch-call relay assembly and typed event decoding
//!
//! The distributed ledger itself stays external: reads, submission, and
//! signing are capability traits implemented by the caller.
//!
//! # Example
//!
//! ```rust
//! use vault_engine::core::{Address, Domain};
//! use vault_engine::crypto::KeyPair;
//! use vault_engine::quorum::SignatureSet;
//! use vault_engine::vault::{DigestSigner, LocalVault, VaultEngine};
//! use primitive_types::U256;
//!
//! // A 2-of-3 vault with an in-memory ledger
//! let mut keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! keys.sort_by_key(|k| k.address());
//! let owners: Vec<Address> = keys.iter().map(|k| k.address()).collect();
//!
//! let vault_address = Address::from_bytes([0xAA; 20]);
//! let admin = Address::from_bytes([0xAD; 20]);
//! let mut ledger = LocalVault::new(1, vault_address, owners, 2, admin).unwrap();
//! let mut engine = VaultEngine::from_reader(ledger.domain().clone(), &ledger).unwrap();
//!
//! // Build, sign, and admit a transfer
//! let action = engine.propose_transfer(keys[0].address(), U256::from(10u64)).unwrap();
//! let digest = engine.digest_for(&action);
//! let mut approvals = SignatureSet::new();
//! approvals.add(keys[0].sign(&digest));
//! approvals.add(keys[1].sign(&digest));
//!
//! let receipt = engine.admit(&action, &approvals, &mut ledger).unwrap();
//! assert!(receipt.block_number.is_some());
//! ```

pub mod authority;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod extensions;
pub mod quorum;
pub mod registry;
pub mod vault;

// Re-export commonly used types
pub use authority::{TransferLedger, TransferProposal};
pub use core::{Action, ActionBuilder, Address, CallKind, Digest, Domain};
pub use crypto::KeyPair;
pub use extensions::{ExtensionRegistry, ModuleCursor};
pub use quorum::{QuorumPolicy, Signature, SignatureSet};
pub use registry::{DeploymentRegistry, HelperRole};
pub use vault::{Batch, LocalVault, Receipt, VaultEngine, VaultEvent};
