//! Account identities
//!
//! Addresses are 20-byte identifiers derived from ECDSA public keys,
//! displayed in EIP-55 mixed-case checksum form. Their byte-lexicographic
//! order is the canonical signature ordering on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::keccak256;

/// Errors from parsing an address string
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must be 40 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("Address contains non-hex characters")]
    InvalidHex,
}

/// A 20-byte account identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address, used as the null sentinel
    pub const ZERO: Address = Address([0u8; 20]);

    /// Construct from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Construct from a byte slice, if it has exactly 20 bytes
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 20] = slice.try_into().ok()?;
        Some(Address(bytes))
    }

    /// Raw byte view
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the zero sentinel
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 mixed-case checksum form with `0x` prefix
    ///
    /// A hex letter is uppercased when the corresponding nibble of the
    /// Keccak-256 hash of the lowercase address is 8 or above.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let shift = if i % 2 == 0 { 4 } else { 0 };
            let nibble = (hash[i / 2] >> shift) & 0x0F;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(AddressError::InvalidLength(s.len()));
        }
        let bytes = hex::decode(s).map_err(|_| AddressError::InvalidHex)?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let displayed = address.to_string();
        let reparsed: Address = displayed.parse().unwrap();
        assert_eq!(address, reparsed);
    }

    #[test]
    fn test_eip55_checksum_vector() {
        // Reference vector from the EIP-55 specification
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(address.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength(4))
        );
        assert_eq!(
            "zz5aaeb6053f3e94c9b9a09f33669435e7ef1bea".parse::<Address>(),
            Err(AddressError::InvalidHex)
        );
    }

    #[test]
    fn test_zero_sentinel() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address([1u8; 20]).is_zero());
    }

    #[test]
    fn test_byte_order_is_total() {
        let low = Address([0u8; 20]);
        let mut high_bytes = [0u8; 20];
        high_bytes[0] = 1;
        let high = Address(high_bytes);
        assert!(low < high);
    }

    #[test]
    fn test_serde_roundtrip() {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(address, back);
    }
}
