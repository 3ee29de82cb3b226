//! Multisig Log - append-only log storage
//!
//! The protocol consumes logs through the [`AppendLog`] trait: current length,
//! range reads, tree hash at a length, conditional atomic append and a bounded
//! wait for a length. Two implementations ship here:
//!
//! - [`MemoryLog`]: in-process, wakes waiters through a watch channel
//! - [`FileLog`] / [`FileStore`]: one atomically replaced file per log
//!
//! [`LogTree`] pairs a metadata log with its content log.

#![forbid(unsafe_code)]

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;
pub mod tree;

pub use error::{LogError, Result};
pub use file::{FileLog, FileStore};
pub use memory::MemoryLog;
pub use traits::{AppendLog, LogState};
pub use tree::{LogTree, TreeState};
