//! Request building
//!
//! A request pins a source log to a target length and the source's tree hash
//! at that length. Building only reads the source; nothing is signed here.

use std::time::Duration;

use multisig_core::{LogTarget, MultisigError, Result, SigningRequest};
use multisig_log::{AppendLog, LogTree};
use tracing::{debug, info};

use crate::config::RequestOptions;

/// Resolve the target for one log
///
/// `allow_empty` admits a target length of zero, which is valid for the
/// content log of a tree that has not stored any blobs yet.
async fn resolve_target<L: AppendLog + ?Sized>(
    source: &L,
    length: u64,
    allow_empty: bool,
    options: RequestOptions,
    timeout: Duration,
) -> Result<LogTarget> {
    if length == 0 && !allow_empty {
        return Err(MultisigError::invalid_length("target length must be positive"));
    }

    let available = source.length().await?;
    if length > available {
        if !options.force {
            return Err(MultisigError::invalid_length(format!(
                "target length {length} exceeds source length {available}"
            )));
        }
        debug!(
            source = %source.identity(),
            length,
            available,
            "Waiting for source to reach forced target length"
        );
        source.await_length(length, timeout).await?;
    }

    Ok(LogTarget {
        length,
        content_hash: source.tree_hash_at(length).await?,
    })
}

/// Build a request replicating `source` up to `length`
pub async fn build_request<L: AppendLog + ?Sized>(
    source: &L,
    length: u64,
    options: RequestOptions,
    timeout: Duration,
) -> Result<SigningRequest> {
    let target = resolve_target(source, length, false, options, timeout).await?;
    let request = SigningRequest::for_log(source.identity(), target);

    info!(
        source = %request.source,
        length,
        content_hash = %target.content_hash,
        "Built signing request"
    );
    Ok(request)
}

/// Build a request replicating both logs of a tree
///
/// The content target defaults to the content log's current length.
pub async fn build_tree_request<L: AppendLog>(
    source: &LogTree<L>,
    metadata_length: u64,
    content_length: Option<u64>,
    options: RequestOptions,
    timeout: Duration,
) -> Result<SigningRequest> {
    let metadata =
        resolve_target(&source.metadata, metadata_length, false, options, timeout).await?;
    let content_length = match content_length {
        Some(length) => length,
        None => source.content.length().await?,
    };
    let content = resolve_target(&source.content, content_length, true, options, timeout).await?;
    let request = SigningRequest::for_tree(source.identity(), metadata, content);

    info!(
        source = %request.source,
        metadata_length,
        content_length,
        "Built tree signing request"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_core::{tree_hash, Identity};
    use multisig_log::MemoryLog;
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_millis(50);

    fn source() -> MemoryLog {
        MemoryLog::with_entries(
            Identity::from_bytes([3u8; 32]),
            [b"c0".to_vec(), b"c1".to_vec(), b"c2".to_vec()],
        )
    }

    #[tokio::test]
    async fn test_request_pins_hash_at_length() {
        let log = source();
        let request = build_request(&log, 2, RequestOptions::default(), WAIT)
            .await
            .unwrap();
        assert_eq!(request.source, log.identity());
        assert_eq!(request.target_length(), 2);
        assert_eq!(
            request.content_hash(),
            tree_hash(&[b"c0".to_vec(), b"c1".to_vec()])
        );
        assert!(!request.is_tree());
    }

    #[tokio::test]
    async fn test_zero_and_excess_length_rejected() {
        let log = source();
        assert!(matches!(
            build_request(&log, 0, RequestOptions::default(), WAIT).await,
            Err(MultisigError::InvalidLength { .. })
        ));
        assert!(matches!(
            build_request(&log, 4, RequestOptions::default(), WAIT).await,
            Err(MultisigError::InvalidLength { .. })
        ));
    }

    #[tokio::test]
    async fn test_forced_length_times_out() {
        let log = source();
        let forced = RequestOptions { force: true };
        assert!(matches!(
            build_request(&log, 4, forced, WAIT).await,
            Err(MultisigError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_forced_length_waits_for_source() {
        let log = Arc::new(source());
        let writer = Arc::clone(&log);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.push(b"c3".to_vec());
        });
        let forced = RequestOptions { force: true };
        let request = build_request(&log, 4, forced, Duration::from_secs(5))
            .await
            .unwrap();
        handle.await.unwrap();
        assert_eq!(request.target_length(), 4);
    }

    #[tokio::test]
    async fn test_tree_request_defaults_content_length() {
        let id = Identity::from_bytes([8u8; 32]);
        let tree = LogTree::new(
            MemoryLog::with_entries(id, [b"/a".to_vec()]),
            MemoryLog::new(id.content_companion()),
        );
        let request = build_tree_request(&tree, 1, None, RequestOptions::default(), WAIT)
            .await
            .unwrap();
        let content = request.content.unwrap();
        assert_eq!(content.length, 0);
        assert_eq!(content.content_hash, tree_hash::<Vec<u8>>(&[]));
    }
}
