//! Protocol configuration and per-call options

use std::time::Duration;

use multisig_core::{MultisigError, Result};

/// Default bound on waiting for a source log to reach a length
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every operation against one signer set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Required distinct valid signers; `None` means a majority of the set
    pub quorum: Option<usize>,
    /// How long to wait for a source log to become locally available
    pub source_timeout: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            quorum: None,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

impl ProtocolConfig {
    /// Require exactly `quorum` signers instead of a majority
    pub fn with_quorum(mut self, quorum: usize) -> Self {
        self.quorum = Some(quorum);
        self
    }

    /// Override the source wait bound
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Quorum threshold for a set of `signers` keys
    ///
    /// A configured quorum must lie in `1..=signers`.
    pub fn effective_quorum(&self, signers: usize) -> Result<usize> {
        match self.quorum {
            None => Ok(signers / 2 + 1),
            Some(q) if q == 0 || q > signers => Err(MultisigError::config(format!(
                "quorum {q} outside 1..={signers}"
            ))),
            Some(q) => Ok(q),
        }
    }
}

/// Options for building a signing request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Allow a target length the source has not reached yet and wait for it
    pub force: bool,
}

/// Options for verifying or committing a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Report what would be applied without writing
    pub dry_run: bool,
    /// Allow the first commit into an empty destination
    pub skip_target_checks: bool,
    /// Proceed even when the source no longer matches the signed hash
    pub force: bool,
}

impl CommitOptions {
    /// Options for a read-only verification
    pub fn review() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}
