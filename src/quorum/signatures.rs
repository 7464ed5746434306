//! Signature collection and threshold verification
//!
//! Collects per-signer approvals over an action digest and verifies them
//! against the authorized owner set: strictly ascending signer order with
//! no duplicates, cryptographic recovery to the claimed signer, owner
//! membership, and the quorum count. Verification is pure; admission is a
//! separate step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Address, Digest};
use crate::crypto::{recover_address, SIGNATURE_BYTES};

/// Errors from quorum verification
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },
    #[error("Signature order invalid at index {index}: signers must be strictly ascending")]
    SignatureOrderInvalid { index: usize },
    #[error("Invalid signature at index {index}")]
    InvalidSignature { index: usize },
    #[error("Unauthorized signer: {0}")]
    UnauthorizedSigner(Address),
    #[error("Malformed signature blob: length {0} is not a multiple of 65")]
    MalformedBlob(usize),
}

/// A single signer approval: claimed identity plus recoverable signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Claimed signer identity
    pub signer: Address,
    /// 65-byte recoverable signature, `r || s || v`
    #[serde(with = "sig_bytes")]
    pub bytes: [u8; SIGNATURE_BYTES],
}

impl Signature {
    /// Create a signature entry
    pub fn new(signer: Address, bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self { signer, bytes }
    }

    /// Recovery byte
    pub fn v(&self) -> u8 {
        self.bytes[64]
    }
}

/// Hex (de)serialization for the fixed-size signature bytes
mod sig_bytes {
    use super::SIGNATURE_BYTES;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &[u8; SIGNATURE_BYTES],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; SIGNATURE_BYTES], D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let decoded = hex::decode(s).map_err(serde::de::Error::custom)?;
        decoded
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature must be 65 bytes"))
    }
}

/// An ordered set of signer approvals over one digest
///
/// The entry order is the wire order: verification checks it rather than
/// repairing it, so a set assembled out of order fails with
/// [`AuthError::SignatureOrderInvalid`]. Use [`SignatureSet::sort_canonical`]
/// when assembling from unordered sources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    entries: Vec<Signature>,
}

impl SignatureSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Build from already-ordered entries
    pub fn from_entries(entries: Vec<Signature>) -> Self {
        Self { entries }
    }

    /// Append an approval in wire position
    pub fn add(&mut self, signature: Signature) {
        self.entries.push(signature);
    }

    /// Sort entries into the canonical ascending-signer order
    pub fn sort_canonical(&mut self) {
        self.entries.sort_by(|a, b| a.signer.cmp(&b.signer));
    }

    /// Number of collected approvals
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no approvals are collected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The collected entries in wire order
    pub fn entries(&self) -> &[Signature] {
        &self.entries
    }

    /// Verify the set against a digest, owner set, and threshold
    ///
    /// All rules must hold; the first violation at the lowest index is
    /// reported. Every entry is checked even once the threshold count is
    /// already satisfied.
    pub fn verify(
        &self,
        digest: &Digest,
        owners: &[Address],
        threshold: usize,
    ) -> Result<(), AuthError> {
        if self.entries.len() < threshold {
            return Err(AuthError::InsufficientSignatures {
                have: self.entries.len(),
                need: threshold,
            });
        }

        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 && self.entries[index - 1].signer >= entry.signer {
                return Err(AuthError::SignatureOrderInvalid { index });
            }

            let recovered = recover_address(digest.as_bytes(), &entry.bytes)
                .map_err(|_| AuthError::InvalidSignature { index })?;
            if recovered != entry.signer {
                return Err(AuthError::InvalidSignature { index });
            }

            if !owners.contains(&recovered) {
                return Err(AuthError::UnauthorizedSigner(recovered));
            }
        }

        Ok(())
    }

    /// Canonical wire form: the 65-byte entries concatenated in order
    pub fn concat(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * SIGNATURE_BYTES);
        for entry in &self.entries {
            out.extend_from_slice(&entry.bytes);
        }
        out
    }

    /// Parse a concatenated signature blob back into entries
    ///
    /// Signer identities are recovered from the digest, so a blob entry
    /// that fails recovery is rejected here rather than in `verify`.
    pub fn parse_concat(digest: &Digest, blob: &[u8]) -> Result<Self, AuthError> {
        if blob.len() % SIGNATURE_BYTES != 0 {
            return Err(AuthError::MalformedBlob(blob.len()));
        }

        let mut entries = Vec::with_capacity(blob.len() / SIGNATURE_BYTES);
        for (index, chunk) in blob.chunks_exact(SIGNATURE_BYTES).enumerate() {
            let bytes: [u8; SIGNATURE_BYTES] =
                chunk.try_into().map_err(|_| AuthError::MalformedBlob(blob.len()))?;
            let signer = recover_address(digest.as_bytes(), &bytes)
                .map_err(|_| AuthError::InvalidSignature { index })?;
            entries.push(Signature::new(signer, bytes));
        }
        Ok(Self { entries })
    }
}
