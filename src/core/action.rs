//! Candidate vault actions
//!
//! An action is a single state-changing request awaiting quorum
//! authorization: an asset transfer, a call into an external contract,
//! or a policy mutation targeting the vault itself. Actions are
//! immutable once built and carry a replay-protection nonce.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::encode::{
    address_from_word, u256_from_word, u64_from_word, word_from_address, word_from_u256,
    word_from_u64, word_from_u8, WORD_BYTES,
};
use crate::core::Address;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted payload size in bytes
pub const MAX_PAYLOAD_BYTES: usize = 131_072;

/// Number of head words in the canonical action encoding:
/// to, value, kind, exec_gas, base_gas, gas_price, fee_token,
/// refund_to, nonce
const HEAD_WORDS: usize = 9;

// =============================================================================
// Error Types
// =============================================================================

/// Action validation and encoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ActionError {
    #[error("Invalid action: destination is the zero address")]
    ZeroDestination,
    #[error("Invalid action: delegated execution cannot carry value")]
    ValueInDelegatedCall,
    #[error("Invalid action: payload is {len} bytes, maximum is {max}")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("Invalid action encoding: {0}")]
    MalformedEncoding(&'static str),
}

// =============================================================================
// Call Kind
// =============================================================================

/// How the vault executes an admitted action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Direct call carrying value and payload to the destination
    Call,
    /// Delegated execution in the vault's own storage context
    DelegateCall,
}

impl CallKind {
    /// Wire byte for this kind
    pub fn as_byte(&self) -> u8 {
        match self {
            CallKind::Call => 0,
            CallKind::DelegateCall => 1,
        }
    }

    /// Parse the wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(CallKind::Call),
            1 => Some(CallKind::DelegateCall),
            _ => None,
        }
    }
}

// =============================================================================
// Action
// =============================================================================

/// A candidate state-changing request
///
/// Field order is the protocol contract: the canonical encoding and the
/// struct hash both walk the fields in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Destination identity
    pub to: Address,
    /// Value amount transferred to the destination
    pub value: U256,
    /// Opaque call payload
    #[serde(with = "hex::serde", default)]
    pub payload: Vec<u8>,
    /// Direct call or delegated execution
    pub kind: CallKind,
    /// Execution gas budget forwarded to the destination
    pub exec_gas: U256,
    /// Base gas reserved for admission overhead
    pub base_gas: U256,
    /// Gas price used for fee refunds
    pub gas_price: U256,
    /// Fee token identity; zero means the native asset
    pub fee_token: Address,
    /// Fee refund recipient; zero means the submitting caller
    pub refund_to: Address,
    /// Replay-protection nonce
    pub nonce: u64,
}

impl Action {
    /// Build a plain value transfer
    pub fn transfer(to: Address, value: U256, nonce: u64) -> Result<Self, ActionError> {
        ActionBuilder::new(to).value(value).nonce(nonce).build()
    }

    /// Build a policy mutation call targeting the vault itself
    pub(crate) fn vault_call(vault: Address, payload: Vec<u8>, nonce: u64) -> Self {
        Self {
            to: vault,
            value: U256::zero(),
            payload,
            kind: CallKind::Call,
            exec_gas: U256::zero(),
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            fee_token: Address::ZERO,
            refund_to: Address::ZERO,
            nonce,
        }
    }

    /// Check the action invariants
    pub fn validate(&self) -> Result<(), ActionError> {
        if self.to.is_zero() {
            return Err(ActionError::ZeroDestination);
        }
        if self.kind == CallKind::DelegateCall && !self.value.is_zero() {
            return Err(ActionError::ValueInDelegatedCall);
        }
        if self.payload.len() > MAX_PAYLOAD_BYTES {
            return Err(ActionError::PayloadTooLarge {
                len: self.payload.len(),
                max: MAX_PAYLOAD_BYTES,
            });
        }
        Ok(())
    }

    /// Canonical byte encoding handed to the submission collaborator
    ///
    /// Nine head words in field order, then the payload as a
    /// length-prefixed tail. This layout is versioned; changing it is a
    /// breaking protocol change.
    pub fn encode(&self) -> Result<Vec<u8>, ActionError> {
        self.validate()?;

        let mut out = Vec::with_capacity((HEAD_WORDS + 1) * WORD_BYTES + self.payload.len());
        out.extend_from_slice(&word_from_address(&self.to));
        out.extend_from_slice(&word_from_u256(&self.value));
        out.extend_from_slice(&word_from_u8(self.kind.as_byte()));
        out.extend_from_slice(&word_from_u256(&self.exec_gas));
        out.extend_from_slice(&word_from_u256(&self.base_gas));
        out.extend_from_slice(&word_from_u256(&self.gas_price));
        out.extend_from_slice(&word_from_address(&self.fee_token));
        out.extend_from_slice(&word_from_address(&self.refund_to));
        out.extend_from_slice(&word_from_u64(self.nonce));
        out.extend_from_slice(&word_from_u64(self.payload.len() as u64));
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Decode the canonical byte encoding
    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let head_len = (HEAD_WORDS + 1) * WORD_BYTES;
        if bytes.len() < head_len {
            return Err(ActionError::MalformedEncoding("truncated head"));
        }

        let word = |i: usize| &bytes[i * WORD_BYTES..(i + 1) * WORD_BYTES];
        let to = address_from_word(word(0))
            .ok_or(ActionError::MalformedEncoding("destination word"))?;
        let value =
            u256_from_word(word(1)).ok_or(ActionError::MalformedEncoding("value word"))?;
        let kind_word =
            u64_from_word(word(2)).ok_or(ActionError::MalformedEncoding("kind word"))?;
        let kind = u8::try_from(kind_word)
            .ok()
            .and_then(CallKind::from_byte)
            .ok_or(ActionError::MalformedEncoding("unknown call kind"))?;
        let exec_gas =
            u256_from_word(word(3)).ok_or(ActionError::MalformedEncoding("exec gas word"))?;
        let base_gas =
            u256_from_word(word(4)).ok_or(ActionError::MalformedEncoding("base gas word"))?;
        let gas_price =
            u256_from_word(word(5)).ok_or(ActionError::MalformedEncoding("gas price word"))?;
        let fee_token = address_from_word(word(6))
            .ok_or(ActionError::MalformedEncoding("fee token word"))?;
        let refund_to = address_from_word(word(7))
            .ok_or(ActionError::MalformedEncoding("refund word"))?;
        let nonce =
            u64_from_word(word(8)).ok_or(ActionError::MalformedEncoding("nonce word"))?;
        let payload_len = u64_from_word(word(9))
            .ok_or(ActionError::MalformedEncoding("payload length word"))?
            as usize;

        if bytes.len() != head_len + payload_len {
            return Err(ActionError::MalformedEncoding("payload length mismatch"));
        }
        let payload = bytes[head_len..].to_vec();

        let action = Self {
            to,
            value,
            payload,
            kind,
            exec_gas,
            base_gas,
            gas_price,
            fee_token,
            refund_to,
            nonce,
        };
        action.validate()?;
        Ok(action)
    }

    /// The 4-byte function selector of the payload, if present
    pub fn payload_selector(&self) -> Option<[u8; 4]> {
        let head: [u8; 4] = self.payload.get(..4)?.try_into().ok()?;
        Some(head)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Action`] values
///
/// Validation happens at `build()`; malformed combinations are rejected
/// with [`ActionError`] before any hashing takes place.
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    action: Action,
}

impl ActionBuilder {
    /// Start an action targeting `to` with all scalars zeroed
    pub fn new(to: Address) -> Self {
        Self {
            action: Action {
                to,
                value: U256::zero(),
                payload: Vec::new(),
                kind: CallKind::Call,
                exec_gas: U256::zero(),
                base_gas: U256::zero(),
                gas_price: U256::zero(),
                fee_token: Address::ZERO,
                refund_to: Address::ZERO,
                nonce: 0,
            },
        }
    }

    /// Set the transferred value
    pub fn value(mut self, value: U256) -> Self {
        self.action.value = value;
        self
    }

    /// Set the call payload
    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.action.payload = payload;
        self
    }

    /// Set the call kind
    pub fn kind(mut self, kind: CallKind) -> Self {
        self.action.kind = kind;
        self
    }

    /// Set the execution gas budget
    pub fn exec_gas(mut self, exec_gas: U256) -> Self {
        self.action.exec_gas = exec_gas;
        self
    }

    /// Set the base gas reserve
    pub fn base_gas(mut self, base_gas: U256) -> Self {
        self.action.base_gas = base_gas;
        self
    }

    /// Set the refund gas price
    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.action.gas_price = gas_price;
        self
    }

    /// Set the fee token
    pub fn fee_token(mut self, fee_token: Address) -> Self {
        self.action.fee_token = fee_token;
        self
    }

    /// Set the refund recipient
    pub fn refund_to(mut self, refund_to: Address) -> Self {
        self.action.refund_to = refund_to;
        self
    }

    /// Set the replay nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.action.nonce = nonce;
        self
    }

    /// Validate and return the finished action
    pub fn build(self) -> Result<Action, ActionError> {
        self.action.validate()?;
        Ok(self.action)
    }
}
