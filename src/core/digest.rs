//! Deterministic digest derivation
//!
//! A digest commits an action to a specific vault, chain, and protocol
//! version through a two-level hashing scheme: a domain hash over the
//! protocol identity and a struct hash over the action fields, combined
//! under a fixed two-byte prefix. Field order, prefix, and domain
//! composition are all part of the versioned protocol contract.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::action::Action;
use crate::core::encode::{word_from_address, word_from_u256, word_from_u64, word_from_u8};
use crate::core::Address;
use crate::crypto::{keccak256, keccak256_concat};

// =============================================================================
// Constants
// =============================================================================

/// Protocol name committed into every domain hash
pub const PROTOCOL_NAME: &str = "VaultQuorum";

/// Current protocol version
pub const PROTOCOL_VERSION: &str = "1.1";

/// Two-byte prefix of the final digest pre-image
pub const DIGEST_PREFIX: [u8; 2] = [0x19, 0x01];

/// Canonical domain type string
pub const DOMAIN_TYPE: &str =
    "Domain(string name,string version,uint256 chainId,address vault)";

/// Canonical action type string; field order mirrors [`Action`]
pub const ACTION_TYPE: &str = "Action(address to,uint256 value,bytes payload,\
uint8 kind,uint256 execGas,uint256 baseGas,uint256 gasPrice,address feeToken,\
address refundTo,uint64 nonce)";

// =============================================================================
// Digest
// =============================================================================

/// A 32-byte action digest, used once for signature collection
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Raw byte view
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Digest {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Digest(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x{})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Domain
// =============================================================================

/// The signing domain: chain, vault, and protocol version
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Chain identity
    pub chain_id: u64,
    /// Vault account the digest is bound to
    pub vault: Address,
    /// Protocol version string
    pub version: String,
}

impl Domain {
    /// Domain for the current protocol version
    pub fn new(chain_id: u64, vault: Address) -> Self {
        Self {
            chain_id,
            vault,
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Hash of the domain component
    pub fn domain_hash(&self) -> [u8; 32] {
        keccak256_concat(&[
            &keccak256(DOMAIN_TYPE.as_bytes()),
            &keccak256(PROTOCOL_NAME.as_bytes()),
            &keccak256(self.version.as_bytes()),
            &word_from_u64(self.chain_id),
            &word_from_address(&self.vault),
        ])
    }

    /// Derive the digest committing `action` to this domain
    ///
    /// Pure and total: two identical actions on the same domain always
    /// produce the same digest.
    pub fn derive(&self, action: &Action) -> Digest {
        let digest = keccak256_concat(&[
            &DIGEST_PREFIX,
            &self.domain_hash(),
            &struct_hash(action),
        ]);
        Digest(digest)
    }
}

/// Hash of the action fields in declaration order
///
/// The payload contributes through its own hash so the struct hash stays
/// fixed-width regardless of payload size.
pub fn struct_hash(action: &Action) -> [u8; 32] {
    keccak256_concat(&[
        &keccak256(ACTION_TYPE.as_bytes()),
        &word_from_address(&action.to),
        &word_from_u256(&action.value),
        &keccak256(&action.payload),
        &word_from_u8(action.kind.as_byte()),
        &word_from_u256(&action.exec_gas),
        &word_from_u256(&action.base_gas),
        &word_from_u256(&action.gas_price),
        &word_from_address(&action.fee_token),
        &word_from_address(&action.refund_to),
        &word_from_u64(action.nonce),
    ])
}
