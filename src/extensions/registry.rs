//! Delegated module and hook registry
//!
//! Tracks the vault's enabled delegated-executor modules plus its single
//! optional transaction guard and fallback handler. Mutations follow the
//! same candidate-action shape as owner changes: `propose_*` validates
//! against the cached state and returns an unsigned action, `apply_*`
//! updates the cache once the action was admitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::encode::CallData;
use crate::core::{Action, Address};

// =============================================================================
// Function signatures
// =============================================================================

/// Enable a delegated module
pub const FN_ENABLE_MODULE: &str = "enableModule(address)";
/// Disable a delegated module, given its predecessor cursor
pub const FN_DISABLE_MODULE: &str = "disableModule(address,address)";
/// Install or clear the transaction guard
pub const FN_SET_GUARD: &str = "setGuard(address)";
/// Install or clear the fallback handler
pub const FN_SET_FALLBACK_HANDLER: &str = "setFallbackHandler(address)";

// =============================================================================
// Error Types
// =============================================================================

/// Precondition violations on extension mutation requests
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("Module already enabled: {0}")]
    AlreadyEnabled(Address),
    #[error("Module not enabled: {0}")]
    NotEnabled(Address),
    #[error("Invalid module address: {0}")]
    InvalidModule(Address),
}

// =============================================================================
// Module cursor
// =============================================================================

/// Opaque predecessor handle for module removal
///
/// The external state keeps modules in a linked representation; removing
/// one needs its predecessor. The cursor is supplied by the read path and
/// passed through untouched, never computed here. [`ModuleCursor::START`]
/// marks the head of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCursor(pub Address);

impl ModuleCursor {
    /// Head-of-list sentinel
    pub const START: ModuleCursor = ModuleCursor(Address({
        let mut bytes = [0u8; 20];
        bytes[19] = 1;
        bytes
    }));
}

// =============================================================================
// ExtensionRegistry
// =============================================================================

/// Cached module/guard/fallback state of one vault
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRegistry {
    /// The vault the registry describes
    vault: Address,
    /// Enabled delegated modules, unique
    modules: Vec<Address>,
    /// Optional transaction guard
    guard: Option<Address>,
    /// Optional fallback handler
    fallback_handler: Option<Address>,
}

impl ExtensionRegistry {
    /// Create an empty registry for a vault
    pub fn new(vault: Address) -> Self {
        Self {
            vault,
            modules: Vec::new(),
            guard: None,
            fallback_handler: None,
        }
    }

    /// The vault this registry describes
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// Currently enabled modules
    pub fn modules(&self) -> &[Address] {
        &self.modules
    }

    /// Whether a module is enabled
    pub fn is_enabled(&self, module: &Address) -> bool {
        self.modules.contains(module)
    }

    /// Current guard, if any
    pub fn guard(&self) -> Option<Address> {
        self.guard
    }

    /// Current fallback handler, if any
    pub fn fallback_handler(&self) -> Option<Address> {
        self.fallback_handler
    }

    // -------------------------------------------------------------------------
    // Candidate builders
    // -------------------------------------------------------------------------

    /// Candidate action enabling `module`
    pub fn propose_enable_module(
        &self,
        module: Address,
        nonce: u64,
    ) -> Result<Action, ExtensionError> {
        self.check_enable(module)?;
        let payload = CallData::new(FN_ENABLE_MODULE).address(&module).finish();
        Ok(Action::vault_call(self.vault, payload, nonce))
    }

    /// Candidate action disabling `module`
    ///
    /// `cursor` is the opaque predecessor handle from the read path.
    pub fn propose_disable_module(
        &self,
        cursor: ModuleCursor,
        module: Address,
        nonce: u64,
    ) -> Result<Action, ExtensionError> {
        self.check_disable(module)?;
        let payload = CallData::new(FN_DISABLE_MODULE)
            .address(&cursor.0)
            .address(&module)
            .finish();
        Ok(Action::vault_call(self.vault, payload, nonce))
    }

    /// Candidate action installing or clearing the guard
    ///
    /// `None` encodes the zero address and clears the slot.
    pub fn propose_set_guard(&self, guard: Option<Address>, nonce: u64) -> Action {
        let target = guard.unwrap_or(Address::ZERO);
        let payload = CallData::new(FN_SET_GUARD).address(&target).finish();
        Action::vault_call(self.vault, payload, nonce)
    }

    /// Candidate action installing or clearing the fallback handler
    pub fn propose_set_fallback_handler(
        &self,
        handler: Option<Address>,
        nonce: u64,
    ) -> Action {
        let target = handler.unwrap_or(Address::ZERO);
        let payload = CallData::new(FN_SET_FALLBACK_HANDLER).address(&target).finish();
        Action::vault_call(self.vault, payload, nonce)
    }

    // -------------------------------------------------------------------------
    // Cache application after admission
    // -------------------------------------------------------------------------

    /// Apply an admitted module enable to the cache
    pub fn apply_enable_module(&mut self, module: Address) -> Result<(), ExtensionError> {
        self.check_enable(module)?;
        self.modules.push(module);
        Ok(())
    }

    /// Apply an admitted module disable to the cache
    pub fn apply_disable_module(&mut self, module: Address) -> Result<(), ExtensionError> {
        self.check_disable(module)?;
        self.modules.retain(|m| *m != module);
        Ok(())
    }

    /// Apply an admitted guard change to the cache
    pub fn apply_set_guard(&mut self, guard: Option<Address>) {
        self.guard = guard.filter(|g| !g.is_zero());
    }

    /// Apply an admitted fallback-handler change to the cache
    pub fn apply_set_fallback_handler(&mut self, handler: Option<Address>) {
        self.fallback_handler = handler.filter(|h| !h.is_zero());
    }

    // -------------------------------------------------------------------------
    // Precondition checks
    // -------------------------------------------------------------------------

    fn check_enable(&self, module: Address) -> Result<(), ExtensionError> {
        if module.is_zero() || module == ModuleCursor::START.0 {
            return Err(ExtensionError::InvalidModule(module));
        }
        if self.is_enabled(&module) {
            return Err(ExtensionError::AlreadyEnabled(module));
        }
        Ok(())
    }

    fn check_disable(&self, module: Address) -> Result<(), ExtensionError> {
        if !self.is_enabled(&module) {
            return Err(ExtensionError::NotEnabled(module));
        }
        Ok(())
    }
}
