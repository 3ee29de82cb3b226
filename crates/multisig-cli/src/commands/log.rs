//! Local source log management

use multisig_core::{Entry, Identity};
use multisig_log::{AppendLog, FileLog, FileStore, LogState};
use serde::Serialize;

/// A log's state and its entries rendered as text
#[derive(Debug, Serialize)]
pub struct LogListing {
    /// Current state
    pub state: LogState,
    /// Entries, lossily decoded as UTF-8
    pub entries: Vec<String>,
}

async fn open(store: &FileStore, identity: &str, content: bool) -> anyhow::Result<FileLog> {
    let identity = Identity::from_hex(identity)?;
    let metadata = store.existing_log(identity).await?;
    if content {
        Ok(store.log(identity.content_companion()))
    } else {
        Ok(metadata)
    }
}

/// Create an empty log and return its state
pub async fn create(store: &FileStore) -> anyhow::Result<LogState> {
    let log = store.create_log().await?;
    Ok(log.state().await?)
}

/// Append text entries at the log's current length
pub async fn append(
    store: &FileStore,
    identity: &str,
    entries: &[String],
    content: bool,
) -> anyhow::Result<LogState> {
    let log = open(store, identity, content).await?;
    let entries: Vec<Entry> = entries.iter().map(|e| e.as_bytes().to_vec()).collect();
    let at = log.length().await?;
    log.append(at, entries).await?;
    Ok(log.state().await?)
}

/// State and entries of a log
pub async fn show(store: &FileStore, identity: &str, content: bool) -> anyhow::Result<LogListing> {
    let log = open(store, identity, content).await?;
    let state = log.state().await?;
    let entries = log
        .read_range(0, state.length)
        .await?
        .iter()
        .map(|e| String::from_utf8_lossy(e).into_owned())
        .collect();
    Ok(LogListing { state, entries })
}
