//! Command handlers for the `multisig` binary

/// Shared context and token decoding
pub mod common;

/// Signer seed generation
pub mod keygen;

/// Local source log management
pub mod log;

/// Answering requests with a signer seed
pub mod sign;

/// Single-log (core) request, verify and commit
pub mod single;

/// Two-log tree (drive) request, verify and commit
pub mod tree;
