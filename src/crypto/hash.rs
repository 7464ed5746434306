//! Keccak-256 hashing utilities
//!
//! Provides the Keccak-256 based hashing functions used for digest
//! derivation, address derivation, and function selectors.

use sha3::{Digest, Keccak256};

/// Computes the Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the Keccak-256 hash over several concatenated slices
///
/// Equivalent to hashing the concatenation, without allocating it.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Computes Keccak-256 and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}

/// First four bytes of the Keccak-256 hash of a function signature
///
/// The signature uses the canonical form without spaces or argument
/// names, e.g. `"transfer(address,uint256)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            keccak256_hex(b""),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_known_vector() {
        assert_eq!(
            keccak256_hex(b"abc"),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_keccak256_concat_matches_joined() {
        let joined = keccak256(b"hello world");
        let parts = keccak256_concat(&[b"hello ", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_selector() {
        // Canonical ERC-20 transfer selector
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }
}
