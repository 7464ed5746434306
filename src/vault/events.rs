//! Typed vault event decoding
//!
//! One decode function per event kind, keyed by the Keccak-256 hash of
//! the event signature. All parameters live in the data section as
//! encoding words; there is no iterator or subscription machinery here,
//! callers pair this with whatever streaming primitive they already use.

use primitive_types::U256;

use crate::core::encode::{address_from_word, u256_from_word, u64_from_word, WORD_BYTES};
use crate::core::{Address, Digest};
use crate::crypto::keccak256;

// =============================================================================
// Event signatures
// =============================================================================

pub const EV_EXECUTION_SUCCEEDED: &str = "ExecutionSucceeded(bytes32,uint256)";
pub const EV_EXECUTION_FAILED: &str = "ExecutionFailed(bytes32)";
pub const EV_ADDED_OWNER: &str = "AddedOwner(address)";
pub const EV_REMOVED_OWNER: &str = "RemovedOwner(address)";
pub const EV_CHANGED_THRESHOLD: &str = "ChangedThreshold(uint256)";
pub const EV_ENABLED_MODULE: &str = "EnabledModule(address)";
pub const EV_DISABLED_MODULE: &str = "DisabledModule(address)";
pub const EV_CHANGED_GUARD: &str = "ChangedGuard(address)";
pub const EV_CHANGED_FALLBACK_HANDLER: &str = "ChangedFallbackHandler(address)";
pub const EV_TRANSFER_PROPOSED: &str = "TransferProposed(uint64,address)";
pub const EV_TRANSFER_CONFIRMED: &str = "TransferConfirmed(uint64,address)";
pub const EV_TRANSFER_CANCELLED: &str = "TransferCancelled(uint64)";

/// Topic hash of an event signature
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

// =============================================================================
// VaultEvent
// =============================================================================

/// A decoded vault notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultEvent {
    ExecutionSucceeded { digest: Digest, payment: U256 },
    ExecutionFailed { digest: Digest },
    AddedOwner { owner: Address },
    RemovedOwner { owner: Address },
    ChangedThreshold { threshold: u64 },
    EnabledModule { module: Address },
    DisabledModule { module: Address },
    ChangedGuard { guard: Address },
    ChangedFallbackHandler { handler: Address },
    TransferProposed { id: u64, successor: Address },
    TransferConfirmed { id: u64, successor: Address },
    TransferCancelled { id: u64 },
}

impl VaultEvent {
    /// Decode a raw log entry by topic hash
    ///
    /// Returns `None` for foreign topics or malformed data sections.
    pub fn decode(topic0: &[u8; 32], data: &[u8]) -> Option<VaultEvent> {
        let word = |i: usize| data.get(i * WORD_BYTES..(i + 1) * WORD_BYTES);
        let digest_arg = |i: usize| -> Option<Digest> {
            let bytes: [u8; 32] = word(i)?.try_into().ok()?;
            Some(Digest(bytes))
        };
        let address_arg = |i: usize| address_from_word(word(i)?);
        let u256_arg = |i: usize| u256_from_word(word(i)?);
        let u64_arg = |i: usize| u64_from_word(word(i)?);

        let event = if *topic0 == event_topic(EV_EXECUTION_SUCCEEDED) {
            VaultEvent::ExecutionSucceeded {
                digest: digest_arg(0)?,
                payment: u256_arg(1)?,
            }
        } else if *topic0 == event_topic(EV_EXECUTION_FAILED) {
            VaultEvent::ExecutionFailed { digest: digest_arg(0)? }
        } else if *topic0 == event_topic(EV_ADDED_OWNER) {
            VaultEvent::AddedOwner { owner: address_arg(0)? }
        } else if *topic0 == event_topic(EV_REMOVED_OWNER) {
            VaultEvent::RemovedOwner { owner: address_arg(0)? }
        } else if *topic0 == event_topic(EV_CHANGED_THRESHOLD) {
            VaultEvent::ChangedThreshold { threshold: u64_arg(0)? }
        } else if *topic0 == event_topic(EV_ENABLED_MODULE) {
            VaultEvent::EnabledModule { module: address_arg(0)? }
        } else if *topic0 == event_topic(EV_DISABLED_MODULE) {
            VaultEvent::DisabledModule { module: address_arg(0)? }
        } else if *topic0 == event_topic(EV_CHANGED_GUARD) {
            VaultEvent::ChangedGuard { guard: address_arg(0)? }
        } else if *topic0 == event_topic(EV_CHANGED_FALLBACK_HANDLER) {
            VaultEvent::ChangedFallbackHandler { handler: address_arg(0)? }
        } else if *topic0 == event_topic(EV_TRANSFER_PROPOSED) {
            VaultEvent::TransferProposed {
                id: u64_arg(0)?,
                successor: address_arg(1)?,
            }
        } else if *topic0 == event_topic(EV_TRANSFER_CONFIRMED) {
            VaultEvent::TransferConfirmed {
                id: u64_arg(0)?,
                successor: address_arg(1)?,
            }
        } else if *topic0 == event_topic(EV_TRANSFER_CANCELLED) {
            VaultEvent::TransferCancelled { id: u64_arg(0)? }
        } else {
            return None;
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encode::{word_from_address, word_from_u256, word_from_u64};

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_decode_execution_succeeded() {
        let digest = Digest([9u8; 32]);
        let mut data = Vec::new();
        data.extend_from_slice(digest.as_bytes());
        data.extend_from_slice(&word_from_u256(&U256::from(1_500u64)));

        let event = VaultEvent::decode(&event_topic(EV_EXECUTION_SUCCEEDED), &data).unwrap();
        assert_eq!(
            event,
            VaultEvent::ExecutionSucceeded {
                digest,
                payment: U256::from(1_500u64),
            }
        );
    }

    #[test]
    fn test_decode_owner_events() {
        let data = word_from_address(&addr(0x11)).to_vec();
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_ADDED_OWNER), &data),
            Some(VaultEvent::AddedOwner { owner: addr(0x11) })
        );
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_REMOVED_OWNER), &data),
            Some(VaultEvent::RemovedOwner { owner: addr(0x11) })
        );

        let threshold = word_from_u64(3).to_vec();
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_CHANGED_THRESHOLD), &threshold),
            Some(VaultEvent::ChangedThreshold { threshold: 3 })
        );
    }

    #[test]
    fn test_decode_extension_events() {
        let data = word_from_address(&addr(0x22)).to_vec();
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_ENABLED_MODULE), &data),
            Some(VaultEvent::EnabledModule { module: addr(0x22) })
        );
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_DISABLED_MODULE), &data),
            Some(VaultEvent::DisabledModule { module: addr(0x22) })
        );
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_CHANGED_GUARD), &data),
            Some(VaultEvent::ChangedGuard { guard: addr(0x22) })
        );
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_CHANGED_FALLBACK_HANDLER), &data),
            Some(VaultEvent::ChangedFallbackHandler { handler: addr(0x22) })
        );
    }

    #[test]
    fn test_decode_transfer_events() {
        let mut data = word_from_u64(4).to_vec();
        data.extend_from_slice(&word_from_address(&addr(0x33)));

        assert_eq!(
            VaultEvent::decode(&event_topic(EV_TRANSFER_PROPOSED), &data),
            Some(VaultEvent::TransferProposed { id: 4, successor: addr(0x33) })
        );
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_TRANSFER_CONFIRMED), &data),
            Some(VaultEvent::TransferConfirmed { id: 4, successor: addr(0x33) })
        );
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_TRANSFER_CANCELLED), &word_from_u64(4)),
            Some(VaultEvent::TransferCancelled { id: 4 })
        );
    }

    #[test]
    fn test_decode_rejects_foreign_topic_and_short_data() {
        let foreign = keccak256(b"Transfer(address,address,uint256)");
        assert_eq!(VaultEvent::decode(&foreign, &[0u8; 32]), None);
        assert_eq!(
            VaultEvent::decode(&event_topic(EV_EXECUTION_SUCCEEDED), &[0u8; 32]),
            None
        );
    }
}
