//! In-memory append-only log

use std::time::Duration;

use async_trait::async_trait;
use multisig_core::merkle::{leaf_hash, tree_hash_from_leaves};
use multisig_core::{Entry, Hash32, Identity};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{LogError, Result};
use crate::traits::{check_range, AppendLog};

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    leaves: Vec<Hash32>,
}

/// In-memory log backed by a `RwLock<Vec>`
///
/// Length changes are published on a watch channel so `await_length` wakes
/// as soon as an append lands.
pub struct MemoryLog {
    identity: Identity,
    inner: RwLock<Inner>,
    length_tx: watch::Sender<u64>,
}

impl MemoryLog {
    /// Create an empty log
    pub fn new(identity: Identity) -> Self {
        let (length_tx, _) = watch::channel(0);
        Self {
            identity,
            inner: RwLock::new(Inner::default()),
            length_tx,
        }
    }

    /// Create a log pre-filled with `entries`
    pub fn with_entries<E: Into<Entry>>(
        identity: Identity,
        entries: impl IntoIterator<Item = E>,
    ) -> Self {
        let log = Self::new(identity);
        {
            let mut inner = log.inner.write();
            for entry in entries {
                let entry = entry.into();
                inner.leaves.push(leaf_hash(&entry));
                inner.entries.push(entry);
            }
            log.length_tx.send_replace(inner.entries.len() as u64);
        }
        log
    }

    /// Append without a length precondition, as the log's own writer would
    pub fn push(&self, entry: impl Into<Entry>) -> u64 {
        let entry = entry.into();
        let mut inner = self.inner.write();
        inner.leaves.push(leaf_hash(&entry));
        inner.entries.push(entry);
        let length = inner.entries.len() as u64;
        self.length_tx.send_replace(length);
        length
    }

    /// Replace the entry at `index` in place
    ///
    /// Breaks append-only semantics on purpose: it models a source whose
    /// history was rewritten after a request was signed.
    pub fn rewrite(&self, index: u64, entry: impl Into<Entry>) -> Result<()> {
        let entry = entry.into();
        let mut inner = self.inner.write();
        let length = inner.entries.len() as u64;
        let slot = usize::try_from(index)
            .ok()
            .filter(|i| *i < inner.entries.len())
            .ok_or(LogError::OutOfBounds {
                start: index,
                end: index + 1,
                length,
            })?;
        inner.leaves[slot] = leaf_hash(&entry);
        inner.entries[slot] = entry;
        Ok(())
    }

    /// Snapshot of every entry
    pub fn entries(&self) -> Vec<Entry> {
        self.inner.read().entries.clone()
    }
}

#[async_trait]
impl AppendLog for MemoryLog {
    fn identity(&self) -> Identity {
        self.identity
    }

    async fn length(&self) -> Result<u64> {
        Ok(self.inner.read().entries.len() as u64)
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<Entry>> {
        let inner = self.inner.read();
        let (start, end) = check_range(start, end, inner.entries.len() as u64)?;
        Ok(inner.entries[start..end].to_vec())
    }

    async fn tree_hash_at(&self, length: u64) -> Result<Hash32> {
        let inner = self.inner.read();
        let (_, end) = check_range(0, length, inner.leaves.len() as u64)?;
        Ok(tree_hash_from_leaves(&inner.leaves[..end]))
    }

    async fn append(&self, at: u64, entries: Vec<Entry>) -> Result<u64> {
        let mut inner = self.inner.write();
        let actual = inner.entries.len() as u64;
        if actual != at {
            return Err(LogError::LengthConflict {
                expected: at,
                actual,
            });
        }

        let count = entries.len();
        for entry in entries {
            inner.leaves.push(leaf_hash(&entry));
            inner.entries.push(entry);
        }
        let length = inner.entries.len() as u64;
        self.length_tx.send_replace(length);

        debug!(identity = %self.identity, appended = count, length, "Appended to memory log");
        Ok(length)
    }

    async fn await_length(&self, length: u64, timeout: Duration) -> Result<()> {
        let mut rx = self.length_tx.subscribe();
        let waited = tokio::time::timeout(timeout, rx.wait_for(|have| *have >= length)).await;
        match waited {
            Ok(Ok(_)) => Ok(()),
            // The sender lives as long as `self`, so the channel cannot close here.
            Ok(Err(_)) | Err(_) => Err(LogError::Timeout {
                length,
                have: *self.length_tx.borrow(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
