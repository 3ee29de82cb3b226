//! Seeded in-memory logs

use multisig_core::{Entry, Identity};
use multisig_log::{LogTree, MemoryLog};

/// Entries `prefix0`, `prefix1`, ... `prefix{n-1}`
pub fn entries(prefix: &str, n: usize) -> Vec<Entry> {
    (0..n).map(|i| format!("{prefix}{i}").into_bytes()).collect()
}

/// Identity filled with one byte
pub fn identity(byte: u8) -> Identity {
    Identity::from_bytes([byte; 32])
}

/// Memory log holding `entries`
pub fn seeded_log(identity: Identity, entries: Vec<Entry>) -> MemoryLog {
    MemoryLog::with_entries(identity, entries)
}

/// Memory tree whose content log is the companion of `identity`
pub fn seeded_tree(
    identity: Identity,
    metadata: Vec<Entry>,
    content: Vec<Entry>,
) -> LogTree<MemoryLog> {
    LogTree::new(
        MemoryLog::with_entries(identity, metadata),
        MemoryLog::with_entries(identity.content_companion(), content),
    )
}
