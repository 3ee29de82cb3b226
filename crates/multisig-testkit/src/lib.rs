//! Multisig Testkit - shared fixtures for protocol tests
//!
//! - [`TestSigners`]: deterministic signer seeds and their responses
//! - [`seeded_log`] / [`seeded_tree`]: in-memory logs with known entries
//! - [`FaultyLog`]: a log wrapper that injects append failures

#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod faults;
pub mod keys;
pub mod logs;

pub use faults::{Fault, FaultyLog};
pub use keys::TestSigners;
pub use logs::{entries, identity, seeded_log, seeded_tree};
