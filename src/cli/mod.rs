//! Command-line interface for the vault engine
//!
//! Offline operator tooling: no command talks to the network.

pub mod commands;

pub use commands::CliResult;
