//! Core trait for append-only logs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use multisig_core::{Entry, Hash32, Identity};
use serde::Serialize;

use crate::error::{LogError, Result};

/// Snapshot of a log's length and tree hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogState {
    /// Log identity
    pub identity: Identity,
    /// Number of entries
    pub length: u64,
    /// Tree hash at `length`
    pub tree_hash: Hash32,
}

/// Validate `[start, end)` against a log of `length` entries
pub(crate) fn check_range(start: u64, end: u64, length: u64) -> Result<(usize, usize)> {
    if start > end || end > length {
        return Err(LogError::OutOfBounds { start, end, length });
    }
    Ok((start as usize, end as usize))
}

/// A content-addressed, monotonically appendable log
///
/// Implementations guarantee that `append` is atomic and totally ordered per
/// log: an interrupted append is either fully visible or fully absent before
/// `length` or `tree_hash_at` report on it.
#[async_trait]
pub trait AppendLog: Send + Sync {
    /// Identity addressing this log
    fn identity(&self) -> Identity;

    /// Current number of entries
    async fn length(&self) -> Result<u64>;

    /// Entries in `[start, end)`
    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<Entry>>;

    /// Tree hash of the log truncated to `length`
    async fn tree_hash_at(&self, length: u64) -> Result<Hash32>;

    /// Append `entries` if and only if the log currently has length `at`
    ///
    /// Returns the new length. Fails with `LengthConflict` and leaves the log
    /// untouched when another writer got there first.
    async fn append(&self, at: u64, entries: Vec<Entry>) -> Result<u64>;

    /// Wait until the log holds at least `length` entries locally
    async fn await_length(&self, length: u64, timeout: Duration) -> Result<()>;

    /// Current length and tree hash
    async fn state(&self) -> Result<LogState> {
        let length = self.length().await?;
        Ok(LogState {
            identity: self.identity(),
            length,
            tree_hash: self.tree_hash_at(length).await?,
        })
    }
}

#[async_trait]
impl<L: AppendLog + ?Sized> AppendLog for Arc<L> {
    fn identity(&self) -> Identity {
        (**self).identity()
    }

    async fn length(&self) -> Result<u64> {
        (**self).length().await
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<Entry>> {
        (**self).read_range(start, end).await
    }

    async fn tree_hash_at(&self, length: u64) -> Result<Hash32> {
        (**self).tree_hash_at(length).await
    }

    async fn append(&self, at: u64, entries: Vec<Entry>) -> Result<u64> {
        (**self).append(at, entries).await
    }

    async fn await_length(&self, length: u64, timeout: Duration) -> Result<()> {
        (**self).await_length(length, timeout).await
    }
}
