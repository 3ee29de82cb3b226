//! Error types for log storage

use multisig_core::{Identity, MultisigError};
use thiserror::Error;

/// Log storage error types
#[derive(Debug, Error)]
pub enum LogError {
    /// Requested range extends past the end of the log
    #[error("Range {start}..{end} out of bounds for log of length {length}")]
    OutOfBounds {
        /// First index requested
        start: u64,
        /// One past the last index requested
        end: u64,
        /// Current log length
        length: u64,
    },

    /// Conditional append found a different length than expected
    #[error("Append expected length {expected}, log has length {actual}")]
    LengthConflict {
        /// Length the caller planned against
        expected: u64,
        /// Length the log actually has
        actual: u64,
    },

    /// Bounded wait for a length expired
    #[error("Timed out after {waited_ms}ms waiting for length {length} (log has {have})")]
    Timeout {
        /// Length that was awaited
        length: u64,
        /// Length reached when the wait expired
        have: u64,
        /// Wait budget in milliseconds
        waited_ms: u64,
    },

    /// No log with this identity exists in the store
    #[error("Log not found: {0}")]
    NotFound(Identity),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),
}

/// Result type for log operations
pub type Result<T> = std::result::Result<T, LogError>;

impl From<bincode::Error> for LogError {
    fn from(err: bincode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<LogError> for MultisigError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Timeout { .. } => MultisigError::timeout(err.to_string()),
            LogError::NotFound(_) => MultisigError::source_unavailable(err.to_string()),
            LogError::LengthConflict { .. } => MultisigError::invalid_state(err.to_string()),
            LogError::OutOfBounds { .. } => MultisigError::invalid_length(err.to_string()),
            LogError::Io(_) | LogError::Codec(_) => MultisigError::storage(err.to_string()),
        }
    }
}
