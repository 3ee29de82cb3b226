//! Signing requests
//!
//! A request names a source log, a target length and the source's tree hash at
//! that length. It is immutable once built; signers respond to the exact bytes
//! of one request instance.

use crate::codec::Token;
use crate::errors::Result;
use crate::hash::{hash, Hash32};
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Wire protocol version written into every request and response
pub const PROTOCOL_VERSION: u16 = 1;

/// Length and content hash one log must reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTarget {
    /// Target length of the log
    pub length: u64,
    /// Tree hash of the source log truncated to `length`
    pub content_hash: Hash32,
}

/// Transportable request for quorum signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    /// Protocol version
    pub version: u16,
    /// Identity of the source log (the metadata log for trees)
    pub source: Identity,
    /// Target for the source log, or the metadata log of a tree
    pub target: LogTarget,
    /// Target for the content log of a tree, absent for single logs
    pub content: Option<LogTarget>,
}

impl SigningRequest {
    /// Request covering a single log
    pub fn for_log(source: Identity, target: LogTarget) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            source,
            target,
            content: None,
        }
    }

    /// Request covering the metadata and content logs of a tree
    pub fn for_tree(source: Identity, metadata: LogTarget, content: LogTarget) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            source,
            target: metadata,
            content: Some(content),
        }
    }

    /// Target length of the (metadata) log
    pub fn target_length(&self) -> u64 {
        self.target.length
    }

    /// Signed content hash of the (metadata) log
    pub fn content_hash(&self) -> Hash32 {
        self.target.content_hash
    }

    /// Whether the request covers a two-log tree
    pub fn is_tree(&self) -> bool {
        self.content.is_some()
    }

    /// Hash binding a response to this exact request instance
    pub fn request_hash(&self) -> Result<Hash32> {
        Ok(hash(&self.to_bytes()?))
    }
}

impl Token for SigningRequest {
    const KIND: &'static str = "signing request";
}
