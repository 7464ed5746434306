//! Cryptographic utilities for the vault engine
//!
//! This module provides:
//! - Keccak-256 hashing and function selectors
//! - Recoverable ECDSA key management (secp256k1)
//! - Signer address derivation

pub mod hash;
pub mod keys;

pub use hash::{keccak256, keccak256_concat, keccak256_hex, selector};
pub use keys::{
    public_key_from_hex, public_key_to_address, recover_address, sign_recoverable, KeyError,
    KeyPair, SIGNATURE_BYTES,
};
