//! Core protocol types for the vault engine
//!
//! This module provides:
//! - 20-byte account identities with checksum display
//! - Candidate actions and their canonical byte encoding
//! - Deterministic two-level digest derivation

pub mod action;
pub mod address;
pub mod digest;
pub mod encode;

pub use action::{Action, ActionBuilder, ActionError, CallKind, MAX_PAYLOAD_BYTES};
pub use address::{Address, AddressError};
pub use digest::{struct_hash, Digest, Domain, PROTOCOL_NAME, PROTOCOL_VERSION};
