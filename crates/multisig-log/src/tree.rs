//! Two-log trees
//!
//! A tree pairs a metadata log with a content log. The metadata log's
//! identity names the tree; the content log is its companion identity.

use multisig_core::Identity;
use serde::Serialize;

use crate::error::Result;
use crate::traits::{AppendLog, LogState};

/// Metadata log and content log of one tree
#[derive(Debug, Clone)]
pub struct LogTree<L> {
    /// Log of tree metadata, whose identity names the tree
    pub metadata: L,
    /// Log of content blobs referenced by the metadata
    pub content: L,
}

/// Snapshot of both logs of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeState {
    /// Metadata log state
    pub metadata: LogState,
    /// Content log state
    pub content: LogState,
}

impl<L: AppendLog> LogTree<L> {
    /// Pair two logs into a tree
    pub fn new(metadata: L, content: L) -> Self {
        Self { metadata, content }
    }

    /// Identity of the tree (its metadata log)
    pub fn identity(&self) -> Identity {
        self.metadata.identity()
    }

    /// Current state of both logs
    pub async fn state(&self) -> Result<TreeState> {
        Ok(TreeState {
            metadata: self.metadata.state().await?,
            content: self.content.state().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLog;

    #[tokio::test]
    async fn test_tree_state() {
        let metadata = Identity::from_bytes([2u8; 32]);
        let tree = LogTree::new(
            MemoryLog::with_entries(metadata, [b"/file1".to_vec()]),
            MemoryLog::with_entries(
                metadata.content_companion(),
                [b"blob".to_vec(), b"blob".to_vec()],
            ),
        );
        let state = tree.state().await.unwrap();
        assert_eq!(tree.identity(), metadata);
        assert_eq!(state.metadata.length, 1);
        assert_eq!(state.content.length, 2);
        assert_eq!(state.content.identity, metadata.content_companion());
    }
}
