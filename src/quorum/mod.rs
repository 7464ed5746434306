//! Threshold authorization for vault actions
//!
//! Provides M-of-N quorum admission: an owner set with an approval
//! threshold, and ordered signature collection and verification over
//! action digests.
//!
//! # Example
//!
//! ```ignore
//! use vault_engine::quorum::{QuorumPolicy, SignatureSet, Signature};
//!
//! // 2-of-3 policy over the cached owner set
//! let policy = QuorumPolicy::new(vault, owners, 2)?;
//!
//! // Collect approvals over the action digest
//! let mut set = SignatureSet::new();
//! set.add(Signature::new(signer_a, sig_a));
//! set.add(Signature::new(signer_b, sig_b));
//!
//! // Pure verification; admission happens afterwards
//! set.verify(&digest, policy.owners(), policy.threshold())?;
//! ```

pub mod policy;
pub mod signatures;

pub use policy::{
    PolicyError, QuorumPolicy, FN_ADD_OWNER, FN_CHANGE_THRESHOLD, FN_REMOVE_OWNER, FN_SWAP_OWNER,
};
pub use signatures::{AuthError, Signature, SignatureSet};
