//! Canonical word encoding
//!
//! Every scalar protocol field is encoded as a 32-byte big-endian word:
//! addresses left-padded to 32 bytes, integers big-endian. Call payloads
//! are a 4-byte function selector followed by argument words. This layout
//! is part of the wire contract and must not change without a protocol
//! version bump.

use primitive_types::U256;

use crate::core::Address;
use crate::crypto::selector;

/// A single 32-byte encoding word
pub type Word = [u8; 32];

/// Size of an encoding word
pub const WORD_BYTES: usize = 32;

/// Encode a U256 as a big-endian word
pub fn word_from_u256(value: &U256) -> Word {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Encode a u64 as a big-endian word
pub fn word_from_u64(value: u64) -> Word {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a single byte as a word
pub fn word_from_u8(value: u8) -> Word {
    let mut word = [0u8; 32];
    word[31] = value;
    word
}

/// Encode an address as a left-padded word
pub fn word_from_address(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Decode an address from a 32-byte word
///
/// Returns `None` when the slice is not a word or the padding bytes
/// are not zero.
pub fn address_from_word(word: &[u8]) -> Option<Address> {
    if word.len() != WORD_BYTES || word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Address::from_slice(&word[12..])
}

/// Decode a U256 from a 32-byte word
pub fn u256_from_word(word: &[u8]) -> Option<U256> {
    if word.len() != WORD_BYTES {
        return None;
    }
    Some(U256::from_big_endian(word))
}

/// Decode a u64 from a 32-byte word, rejecting overflow
pub fn u64_from_word(word: &[u8]) -> Option<u64> {
    let value = u256_from_word(word)?;
    if value > U256::from(u64::MAX) {
        return None;
    }
    Some(value.as_u64())
}

/// Builder for selector-prefixed call payloads
///
/// ```
/// use vault_engine::core::encode::CallData;
/// use primitive_types::U256;
///
/// let payload = CallData::new("changeThreshold(uint256)")
///     .uint(&U256::from(2u64))
///     .finish();
/// assert_eq!(payload.len(), 4 + 32);
/// ```
#[derive(Debug, Clone)]
pub struct CallData {
    bytes: Vec<u8>,
}

impl CallData {
    /// Start a payload for the named function signature
    pub fn new(signature: &str) -> Self {
        Self {
            bytes: selector(signature).to_vec(),
        }
    }

    /// Append an address argument
    pub fn address(mut self, address: &Address) -> Self {
        self.bytes.extend_from_slice(&word_from_address(address));
        self
    }

    /// Append a uint256 argument
    pub fn uint(mut self, value: &U256) -> Self {
        self.bytes.extend_from_slice(&word_from_u256(value));
        self
    }

    /// Append a uint argument from a u64
    pub fn uint64(mut self, value: u64) -> Self {
        self.bytes.extend_from_slice(&word_from_u64(value));
        self
    }

    /// Append a dynamic `bytes` argument (offset, length, padded data)
    pub fn bytes_arg(mut self, data: &[u8]) -> Self {
        // Single dynamic argument: head is the offset to the tail
        self.bytes.extend_from_slice(&word_from_u64(WORD_BYTES as u64));
        self.bytes.extend_from_slice(&word_from_u64(data.len() as u64));
        self.bytes.extend_from_slice(data);
        let padding = (WORD_BYTES - data.len() % WORD_BYTES) % WORD_BYTES;
        self.bytes.extend_from_slice(&vec![0u8; padding]);
        self
    }

    /// Consume the builder and return the payload bytes
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
