//! Batch planning
//!
//! Planning reads the source and destination and decides which entries a
//! commit would append. It never writes, so a verification and a commit plan
//! exactly the same batch for the same log states.

use std::time::Duration;

use multisig_core::{Entry, Hash32, LogTarget, MultisigError, Result};
use multisig_log::{AppendLog, LogState};
use serde::Serialize;
use tracing::warn;

use crate::config::CommitOptions;

/// Entries to append to one destination log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// Destination length the batch applies at
    pub start: u64,
    /// Destination length after the batch
    pub end: u64,
    /// Entries copied from the source, `end - start` of them
    #[serde(serialize_with = "multisig_core::hex_serde::entries_as_hex")]
    pub entries: Vec<Entry>,
    /// Tree hash the destination must have at `end` once applied
    pub tree_hash: Hash32,
    /// Whether a force override was in effect
    pub forced: bool,
}

impl Batch {
    /// Number of entries to append
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the destination already holds the target
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Plan of one log: states observed and the batch derived from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogPlan {
    /// Destination log state before applying
    pub destination: LogState,
    /// Source log state when planned
    pub source: LogState,
    /// Entries to append
    pub batch: Batch,
}

/// Plan the batch bringing `destination` to `target`
///
/// Guards run in order:
///
/// 1. A destination already at the target length needs nothing (replay).
/// 2. An empty destination needs `skip_target_checks` (first commit).
/// 3. A destination past the target is never rolled back.
/// 4. The source must reach the target length within `timeout`.
/// 5. The source tree hash at the target must equal the signed hash.
/// 6. A non-empty destination must be a prefix of the source.
///
/// Guards 5 and 6 are bypassed by `force`, with a warning.
pub async fn plan_batch<S, D>(
    source: &S,
    destination: &D,
    target: &LogTarget,
    options: CommitOptions,
    timeout: Duration,
) -> Result<LogPlan>
where
    S: AppendLog + ?Sized,
    D: AppendLog + ?Sized,
{
    let destination_state = destination.state().await?;
    let have = destination_state.length;

    if have == target.length {
        if destination_state.tree_hash != target.content_hash {
            warn!(
                destination = %destination_state.identity,
                length = have,
                expected = %target.content_hash,
                actual = %destination_state.tree_hash,
                "Destination already at target length with a different hash"
            );
        }
        let source_state = source.state().await?;
        return Ok(LogPlan {
            batch: Batch {
                start: have,
                end: have,
                entries: Vec::new(),
                tree_hash: destination_state.tree_hash,
                forced: options.force,
            },
            destination: destination_state,
            source: source_state,
        });
    }

    if have == 0 && !options.skip_target_checks {
        return Err(MultisigError::invalid_state(format!(
            "destination {} is empty; the first commit must skip target checks",
            destination_state.identity
        )));
    }

    if have > target.length {
        return Err(MultisigError::invalid_state(format!(
            "destination length {have} is past target length {}",
            target.length
        )));
    }

    source.await_length(target.length, timeout).await?;

    let source_hash = source.tree_hash_at(target.length).await?;
    if source_hash != target.content_hash {
        if !options.force {
            return Err(MultisigError::HashMismatch {
                length: target.length,
                expected: target.content_hash,
                actual: source_hash,
            });
        }
        warn!(
            source = %source.identity(),
            length = target.length,
            expected = %target.content_hash,
            actual = %source_hash,
            "Forcing batch past source hash mismatch"
        );
    }

    if have > 0 {
        let source_prefix = source.tree_hash_at(have).await?;
        if source_prefix != destination_state.tree_hash {
            if !options.force {
                return Err(MultisigError::invalid_state(format!(
                    "destination {} is not a prefix of source {} at length {have}",
                    destination_state.identity,
                    source.identity()
                )));
            }
            warn!(
                destination = %destination_state.identity,
                length = have,
                "Forcing batch onto a destination that diverged from the source"
            );
        }
    }

    let entries = source.read_range(have, target.length).await?;
    let source_state = source.state().await?;

    Ok(LogPlan {
        destination: destination_state,
        source: source_state,
        batch: Batch {
            start: have,
            end: target.length,
            entries,
            tree_hash: source_hash,
            forced: options.force,
        },
    })
}
