//! CLI commands for the vault engine
//!
//! Implements the offline command handlers: key generation, digest
//! derivation, signing, bundle verification, and deployment lookup.
//! No command performs network I/O; submission stays with the caller's
//! own transport.

use std::fs;
use std::path::Path;

use crate::core::{Action, Address, Domain};
use crate::crypto::KeyPair;
use crate::quorum::{Signature, SignatureSet};
use crate::registry::{DeploymentRegistry, HelperRole};
use crate::vault::DigestSigner;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Read an action description from a JSON file
fn load_action(path: &Path) -> CliResult<Action> {
    let raw = fs::read_to_string(path)?;
    let action: Action = serde_json::from_str(&raw)?;
    action.validate()?;
    Ok(action)
}

/// Generate a fresh signer key pair
pub fn cmd_keygen() -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔑 New signer key pair");
    println!("   Address:     {}", key.address());
    println!("   Public key:  {}", key.public_key_hex());
    println!("   Private key: {}", key.private_key_hex());
    println!();
    println!("⚠️  Store the private key securely; it is never persisted here.");
    Ok(())
}

/// Show the signer address for a private key
pub fn cmd_address(key_hex: &str) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(key_hex)?;
    println!("{}", key.address());
    Ok(())
}

/// Derive the digest of an action against a domain
pub fn cmd_digest(action_path: &Path, chain_id: u64, vault: &str) -> CliResult<()> {
    let action = load_action(action_path)?;
    let vault: Address = vault.parse()?;
    let domain = Domain::new(chain_id, vault);
    let digest = domain.derive(&action);

    println!("🧾 Action digest");
    println!("   Vault:    {vault}");
    println!("   Chain:    {chain_id}");
    println!("   Version:  {}", domain.version);
    println!("   Nonce:    {}", action.nonce);
    println!("   Digest:   {digest}");
    Ok(())
}

/// Sign an action and print the approval entry as JSON
pub fn cmd_sign(action_path: &Path, chain_id: u64, vault: &str, key_hex: &str) -> CliResult<()> {
    let action = load_action(action_path)?;
    let vault: Address = vault.parse()?;
    let key = KeyPair::from_private_key_hex(key_hex)?;
    let digest = Domain::new(chain_id, vault).derive(&action);
    let signature = key.sign(&digest);

    println!("{}", serde_json::to_string_pretty(&signature)?);
    Ok(())
}

/// Verify a signature bundle against an owner set and threshold
pub fn cmd_verify(
    action_path: &Path,
    chain_id: u64,
    vault: &str,
    bundle_path: &Path,
    owners: &str,
    threshold: usize,
) -> CliResult<()> {
    let action = load_action(action_path)?;
    let vault: Address = vault.parse()?;
    let digest = Domain::new(chain_id, vault).derive(&action);

    let raw = fs::read_to_string(bundle_path)?;
    let entries: Vec<Signature> = serde_json::from_str(&raw)?;
    let mut set = SignatureSet::from_entries(entries);
    set.sort_canonical();

    let owners: Vec<Address> = owners
        .split(',')
        .map(|s| s.trim().parse::<Address>())
        .collect::<Result<_, _>>()?;

    match set.verify(&digest, &owners, threshold) {
        Ok(()) => {
            println!("✅ Quorum satisfied: {} signature(s), threshold {}", set.len(), threshold);
            println!("   Digest: {digest}");
            println!("   Wire blob: {}", hex::encode(set.concat()));
            Ok(())
        }
        Err(e) => {
            println!("❌ Verification failed: {e}");
            Err(e.into())
        }
    }
}

/// Look up a helper deployment
pub fn cmd_lookup(chain_id: u64, version: &str, role: &str) -> CliResult<()> {
    let role = parse_role(role)?;
    let registry = DeploymentRegistry::bundled();

    match registry.lookup(chain_id, version, role) {
        Some(address) => {
            println!("{address}");
            Ok(())
        }
        None => {
            println!("⚠️  No {role:?} deployment for chain {chain_id}, version {version}");
            Err("deployment not found".into())
        }
    }
}

fn parse_role(role: &str) -> CliResult<HelperRole> {
    let parsed = match role.to_ascii_lowercase().as_str() {
        "proxy-deployer" => HelperRole::ProxyDeployer,
        "batch-relay" => HelperRole::BatchRelay,
        "batch-relay-read-only" => HelperRole::BatchRelayReadOnly,
        "fallback-handler" => HelperRole::FallbackHandlerTemplate,
        "create-helper" => HelperRole::CreateHelper,
        "sign-message-helper" => HelperRole::SignMessageHelper,
        other => return Err(format!("unknown role: {other}").into()),
    };
    Ok(parsed)
}
