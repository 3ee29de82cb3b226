//! Multisig CLI library
//!
//! Command handlers return serializable results; the `multisig` binary
//! renders them.

/// Command handlers
pub mod commands;

/// Configuration file loading
pub mod config;

pub use config::CliConfig;
