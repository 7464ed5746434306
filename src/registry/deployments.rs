//! Helper contract deployment lookup
//!
//! A pure, immutable table mapping `(chain, protocol version, role)` to
//! the deployed helper contract identity. Loaded once at startup and
//! passed by reference; there is no mutable global state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::Address;

/// Roles a helper deployment can fill
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelperRole {
    /// Deploys new vault proxies
    ProxyDeployer,
    /// Batch-call relay accepting delegated execution
    BatchRelay,
    /// Batch-call relay restricted to plain calls
    BatchRelayReadOnly,
    /// Template installed as the default fallback handler
    FallbackHandlerTemplate,
    /// Deterministic-create helper
    CreateHelper,
    /// Off-chain message signing helper
    SignMessageHelper,
}

/// One row of the deployment table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEntry {
    pub chain_id: u64,
    pub version: String,
    pub role: HelperRole,
    pub address: Address,
}

/// Immutable deployment lookup table
#[derive(Clone, Debug, Default)]
pub struct DeploymentRegistry {
    entries: HashMap<(u64, String, HelperRole), Address>,
}

impl DeploymentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the canonical helper deployments bundled in
    pub fn bundled() -> Self {
        let mut registry = Self::new();
        for (chain_id, version) in [(1u64, "1.0"), (1, "1.1"), (10, "1.1"), (137, "1.1")] {
            for (role, address) in [
                (HelperRole::ProxyDeployer, "0xd3f881b6fa3aafcd81f9b62e8a0b1e8e4c6ef245"),
                (HelperRole::BatchRelay, "0x998739bfdaadde7c933b942a68053933098f9eda"),
                (HelperRole::BatchRelayReadOnly, "0xa1dabef33b3b82c7814b6d82a79e50f4ac44102b"),
                (HelperRole::FallbackHandlerTemplate, "0x017062a1de2fe6b99be3d9d37841fed19f573804"),
                (HelperRole::CreateHelper, "0x7cbb62eaa69f79e6873cd1ecb2392971036cfaa4"),
                (HelperRole::SignMessageHelper, "0x98ffbbf51bb33a056b08ddf711f289936aafd42c"),
            ] {
                let parsed = address.parse().unwrap_or(Address::ZERO);
                registry.insert(chain_id, version, role, parsed);
            }
        }
        registry
    }

    /// Add or replace an entry
    pub fn insert(&mut self, chain_id: u64, version: &str, role: HelperRole, address: Address) {
        self.entries.insert((chain_id, version.to_string(), role), address);
    }

    /// Look up a helper deployment
    pub fn lookup(&self, chain_id: u64, version: &str, role: HelperRole) -> Option<Address> {
        self.entries.get(&(chain_id, version.to_string(), role)).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the table as rows, for JSON serialization
    pub fn to_entries(&self) -> Vec<DeploymentEntry> {
        let mut rows: Vec<DeploymentEntry> = self
            .entries
            .iter()
            .map(|((chain_id, version, role), address)| DeploymentEntry {
                chain_id: *chain_id,
                version: version.clone(),
                role: *role,
                address: *address,
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.chain_id, &a.version, format!("{:?}", a.role))
                .cmp(&(b.chain_id, &b.version, format!("{:?}", b.role)))
        });
        rows
    }

    /// Build a registry from rows, as produced by [`Self::to_entries`]
    pub fn from_entries(rows: Vec<DeploymentEntry>) -> Self {
        let mut registry = Self::new();
        for row in rows {
            registry.insert(row.chain_id, &row.version, row.role, row.address);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_lookup_hit() {
        let registry = DeploymentRegistry::bundled();
        let relay = registry.lookup(1, "1.1", HelperRole::BatchRelay);
        assert!(relay.is_some());
        assert!(!relay.unwrap().is_zero());
    }

    #[test]
    fn test_lookup_miss() {
        let registry = DeploymentRegistry::bundled();
        assert_eq!(registry.lookup(999, "1.1", HelperRole::BatchRelay), None);
        assert_eq!(registry.lookup(1, "9.9", HelperRole::BatchRelay), None);
    }

    #[test]
    fn test_insert_overrides() {
        let mut registry = DeploymentRegistry::new();
        let first = Address::from_bytes([1u8; 20]);
        let second = Address::from_bytes([2u8; 20]);

        registry.insert(5, "1.1", HelperRole::CreateHelper, first);
        registry.insert(5, "1.1", HelperRole::CreateHelper, second);
        assert_eq!(registry.lookup(5, "1.1", HelperRole::CreateHelper), Some(second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entries_roundtrip() {
        let registry = DeploymentRegistry::bundled();
        let rows = registry.to_entries();
        let rebuilt = DeploymentRegistry::from_entries(rows.clone());
        assert_eq!(rebuilt.len(), registry.len());
        assert_eq!(rebuilt.to_entries(), rows);

        let json = serde_json::to_string(&rows).unwrap();
        let parsed: Vec<DeploymentEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rows);
    }
}
