//! Batch-call relay encoding
//!
//! Packs several calls into one action routed through the batch relay
//! helper via delegated execution. Each item is packed as
//! `kind(1) || to(20) || value(32) || len(32) || payload`, concatenated
//! in order; the wrapping action carries the packed blob as a single
//! dynamic `bytes` argument.

use primitive_types::U256;
use thiserror::Error;

use crate::core::encode::CallData;
use crate::core::{Action, ActionBuilder, ActionError, Address, CallKind};
use crate::registry::HelperRole;

/// Relay entrypoint accepting the packed item blob
pub const FN_BATCH: &str = "batch(bytes)";

/// Errors from batch assembly
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch is empty")]
    Empty,
    #[error("Item {index} uses delegated execution, which the read-only relay rejects")]
    DelegateCallNotAllowed { index: usize },
    #[error("Role {0:?} is not a batch relay")]
    NotARelay(HelperRole),
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// One call inside a batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchItem {
    pub kind: CallKind,
    pub to: Address,
    pub value: U256,
    pub payload: Vec<u8>,
}

/// An ordered collection of calls for the batch relay
#[derive(Clone, Debug, Default)]
pub struct Batch {
    items: Vec<BatchItem>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    pub fn add(&mut self, item: BatchItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Append a plain call
    pub fn add_call(&mut self, to: Address, value: U256, payload: Vec<u8>) -> &mut Self {
        self.add(BatchItem {
            kind: CallKind::Call,
            to,
            value,
            payload,
        })
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no items were added
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items in order
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Packed wire form of the items
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for item in &self.items {
            out.push(item.kind.as_byte());
            out.extend_from_slice(item.to.as_bytes());
            let mut value = [0u8; 32];
            item.value.to_big_endian(&mut value);
            out.extend_from_slice(&value);
            out.extend_from_slice(&(item.payload.len() as u64).to_be_bytes());
            out.extend_from_slice(&[0u8; 24]);
            out.extend_from_slice(&item.payload);
        }
        out
    }

    /// Wrap the batch into a single delegated action targeting `relay`
    ///
    /// `role` names which relay variant the address was resolved for;
    /// delegated items are only accepted by the writable variant.
    pub fn into_action(
        &self,
        relay: Address,
        role: HelperRole,
        nonce: u64,
    ) -> Result<Action, BatchError> {
        if self.items.is_empty() {
            return Err(BatchError::Empty);
        }
        match role {
            HelperRole::BatchRelay => {}
            HelperRole::BatchRelayReadOnly => {
                if let Some(index) = self
                    .items
                    .iter()
                    .position(|item| item.kind == CallKind::DelegateCall)
                {
                    return Err(BatchError::DelegateCallNotAllowed { index });
                }
            }
            other => return Err(BatchError::NotARelay(other)),
        }

        let payload = CallData::new(FN_BATCH).bytes_arg(&self.pack()).finish();
        let action = ActionBuilder::new(relay)
            .kind(CallKind::DelegateCall)
            .payload(payload)
            .nonce(nonce)
            .build()?;
        Ok(action)
    }
}
