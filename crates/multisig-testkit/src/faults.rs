//! Fault injection for destination logs

use std::time::Duration;

use async_trait::async_trait;
use multisig_core::{Entry, Hash32, Identity};
use multisig_log::{AppendLog, LogError, Result};
use parking_lot::Mutex;
use tracing::debug;

/// Failure to inject into the next append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail the append with an I/O error and write nothing
    Reject,
    /// Write only the first half of the entries but report success
    Torn,
    /// Let another writer append these entries first
    Race(Vec<Entry>),
}

/// Wrapper that injects one armed fault into the next append
pub struct FaultyLog<L> {
    inner: L,
    armed: Mutex<Option<Fault>>,
}

impl<L: AppendLog> FaultyLog<L> {
    /// Wrap a log with no fault armed
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            armed: Mutex::new(None),
        }
    }

    /// Arm `fault` for the next append
    pub fn fail_next(&self, fault: Fault) {
        *self.armed.lock() = Some(fault);
    }

    /// Wrapped log
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: AppendLog> AppendLog for FaultyLog<L> {
    fn identity(&self) -> Identity {
        self.inner.identity()
    }

    async fn length(&self) -> Result<u64> {
        self.inner.length().await
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<Entry>> {
        self.inner.read_range(start, end).await
    }

    async fn tree_hash_at(&self, length: u64) -> Result<Hash32> {
        self.inner.tree_hash_at(length).await
    }

    async fn append(&self, at: u64, entries: Vec<Entry>) -> Result<u64> {
        let fault = self.armed.lock().take();
        match fault {
            None => self.inner.append(at, entries).await,
            Some(Fault::Reject) => {
                debug!(at, "Injected append rejection");
                Err(LogError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected append failure",
                )))
            }
            Some(Fault::Torn) => {
                debug!(at, "Injected torn append");
                let count = entries.len() as u64;
                let half = entries[..entries.len() / 2].to_vec();
                self.inner.append(at, half).await?;
                Ok(at + count)
            }
            Some(Fault::Race(foreign)) => {
                debug!(at, "Injected concurrent writer");
                self.inner.append(at, foreign).await?;
                self.inner.append(at, entries).await
            }
        }
    }

    async fn await_length(&self, length: u64, timeout: Duration) -> Result<()> {
        self.inner.await_length(length, timeout).await
    }
}
