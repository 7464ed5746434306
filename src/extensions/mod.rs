//! Delegated modules, guard, and fallback handler
//!
//! Modules act on the vault's behalf outside the signature-quorum path;
//! the guard and fallback handler are single optional hooks. All
//! mutations ride the same candidate-action pipeline as owner changes.

pub mod registry;

pub use registry::{
    ExtensionError, ExtensionRegistry, ModuleCursor, FN_DISABLE_MODULE, FN_ENABLE_MODULE,
    FN_SET_FALLBACK_HANDLER, FN_SET_GUARD,
};
