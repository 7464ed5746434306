//! Vault Engine CLI Application
//!
//! A command-line interface for building, signing, and verifying
//! vault actions offline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use vault_engine::cli::commands;

#[derive(Parser)]
#[command(name = "vault")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Client-side engine for multi-party vault accounts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signer key pair
    Keygen,

    /// Show the signer address for a private key
    Address {
        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,
    },

    /// Derive the digest of an action
    Digest {
        /// Path to the action JSON file
        #[arg(short, long)]
        action: PathBuf,

        /// Chain identity
        #[arg(short, long)]
        chain_id: u64,

        /// Vault address
        #[arg(short, long)]
        vault: String,
    },

    /// Sign an action with a private key
    Sign {
        /// Path to the action JSON file
        #[arg(short, long)]
        action: PathBuf,

        /// Chain identity
        #[arg(short, long)]
        chain_id: u64,

        /// Vault address
        #[arg(short, long)]
        vault: String,

        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,
    },

    /// Verify a signature bundle against an owner set
    Verify {
        /// Path to the action JSON file
        #[arg(short, long)]
        action: PathBuf,

        /// Chain identity
        #[arg(short, long)]
        chain_id: u64,

        /// Vault address
        #[arg(short, long)]
        vault: String,

        /// Path to the signature bundle JSON file
        #[arg(short, long)]
        bundle: PathBuf,

        /// Comma-separated owner addresses
        #[arg(short, long)]
        owners: String,

        /// Approval threshold
        #[arg(short, long)]
        threshold: usize,
    },

    /// Look up a helper contract deployment
    Lookup {
        /// Chain identity
        #[arg(short, long)]
        chain_id: u64,

        /// Protocol version
        #[arg(short, long, default_value = "1.1")]
        version: String,

        /// Helper role (proxy-deployer, batch-relay, batch-relay-read-only,
        /// fallback-handler, create-helper, sign-message-helper)
        #[arg(short, long)]
        role: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Keygen => commands::cmd_keygen(),
        Commands::Address { key } => commands::cmd_address(&key),
        Commands::Digest {
            action,
            chain_id,
            vault,
        } => commands::cmd_digest(&action, chain_id, &vault),
        Commands::Sign {
            action,
            chain_id,
            vault,
            key,
        } => commands::cmd_sign(&action, chain_id, &vault, &key),
        Commands::Verify {
            action,
            chain_id,
            vault,
            bundle,
            owners,
            threshold,
        } => commands::cmd_verify(&action, chain_id, &vault, &bundle, &owners, threshold),
        Commands::Lookup {
            chain_id,
            version,
            role,
        } => commands::cmd_lookup(chain_id, &version, &role),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
