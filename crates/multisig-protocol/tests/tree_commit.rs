//! Two-log tree commits

use assert_matches::assert_matches;
use multisig_core::MultisigError;
use multisig_log::{AppendLog, LogTree, MemoryLog};
use multisig_protocol::{CommitOptions, Multisig, ProtocolConfig, RequestOptions};
use multisig_testkit::{entries, identity, seeded_tree, Fault, FaultyLog, TestSigners};
use std::time::Duration;

fn multisig(signers: &TestSigners) -> Multisig {
    let config = ProtocolConfig::default().with_source_timeout(Duration::from_millis(50));
    Multisig::new(signers.set(), config).unwrap()
}

fn first_commit() -> CommitOptions {
    CommitOptions {
        skip_target_checks: true,
        ..CommitOptions::default()
    }
}

#[tokio::test]
async fn test_tree_commit_copies_both_logs() {
    let signers = TestSigners::new("drive", 3);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 2), entries("blob", 3));
    let destination = seeded_tree(multisig.identity(), Vec::new(), Vec::new());

    let req = multisig
        .request_tree(&source, 2, None, RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[0, 1]);

    let result = multisig
        .commit_tree(&req, &responses, &source, &destination, first_commit())
        .await
        .unwrap();

    assert_eq!(result.identity, multisig.identity());
    assert_eq!(result.metadata.applied_length, 2);
    assert_eq!(result.content.applied_length, 3);
    assert_eq!(destination.metadata.entries(), entries("/file", 2));
    assert_eq!(destination.content.entries(), entries("blob", 3));
    assert_eq!(
        destination.content.identity(),
        multisig.identity().content_companion()
    );
}

#[tokio::test]
async fn test_tree_update_after_first_commit() {
    let signers = TestSigners::new("drive", 3);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 3), entries("blob", 4));
    let destination = seeded_tree(multisig.identity(), entries("/file", 1), entries("blob", 1));

    let req = multisig
        .request_tree(&source, 3, Some(4), RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[1, 2]);

    let review = multisig
        .verify_tree(&req, &responses, &source, &destination, CommitOptions::default())
        .await
        .unwrap();
    assert_eq!(review.metadata.batch.len(), 2);
    assert_eq!(review.content.batch.len(), 3);
    assert_eq!(destination.metadata.length().await.unwrap(), 1);

    let result = multisig
        .commit_tree(&req, &responses, &source, &destination, CommitOptions::default())
        .await
        .unwrap();
    assert_eq!(result.metadata.batch_size, 2);
    assert_eq!(result.content.batch_size, 3);
}

#[tokio::test]
async fn test_tree_request_rejected_for_single_log() {
    let signers = TestSigners::new("drive", 1);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 1), entries("blob", 1));
    let destination = MemoryLog::new(multisig.identity());

    let req = multisig
        .request_tree(&source, 1, None, RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[0]);

    let err = multisig
        .commit(&req, &responses, &source.metadata, &destination, first_commit())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::InvalidState { .. });
}

#[tokio::test]
async fn test_metadata_failure_after_content_is_partial_apply() {
    let signers = TestSigners::new("drive", 3);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 2), entries("blob", 2));
    let destination = LogTree::new(
        FaultyLog::new(MemoryLog::new(multisig.identity())),
        FaultyLog::new(MemoryLog::new(multisig.identity().content_companion())),
    );

    let req = multisig
        .request_tree(&source, 2, None, RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[0, 2]);
    destination.metadata.fail_next(Fault::Reject);

    let err = multisig
        .commit_tree(&req, &responses, &source, &destination, first_commit())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::PartialApplyDetected { .. });
    assert_eq!(destination.content.length().await.unwrap(), 2);
    assert_eq!(destination.metadata.length().await.unwrap(), 0);

    // Replaying the same signed request finishes the metadata log.
    let result = multisig
        .commit_tree(&req, &responses, &source, &destination, first_commit())
        .await
        .unwrap();
    assert_eq!(result.content.batch_size, 0);
    assert_eq!(result.metadata.batch_size, 2);
}

#[tokio::test]
async fn test_tree_plans_fail_before_any_write() {
    let signers = TestSigners::new("drive", 3);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 2), entries("blob", 2));
    let destination = seeded_tree(multisig.identity(), Vec::new(), Vec::new());

    let req = multisig
        .request_tree(&source, 2, None, RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[0, 1]);
    source.metadata.rewrite(0, b"/moved".to_vec()).unwrap();

    let err = multisig
        .commit_tree(&req, &responses, &source, &destination, first_commit())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::HashMismatch { .. });
    assert_eq!(destination.content.length().await.unwrap(), 0);
}

#[tokio::test]
async fn test_tree_update_after_first_commit_without_content() {
    let signers = TestSigners::new("drive", 3);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 1), Vec::new());
    let destination = seeded_tree(multisig.identity(), Vec::new(), Vec::new());

    let req = multisig
        .request_tree(&source, 1, Some(0), RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[0, 1]);
    let result = multisig
        .commit_tree(&req, &responses, &source, &destination, first_commit())
        .await
        .unwrap();
    assert_eq!(result.metadata.applied_length, 1);
    assert_eq!(result.content.applied_length, 0);

    // The source gains its first blob.
    source
        .metadata
        .append(1, entries("/file", 2)[1..].to_vec())
        .await
        .unwrap();
    source.content.append(0, entries("blob", 1)).await.unwrap();

    let req = multisig
        .request_tree(&source, 2, Some(1), RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[1, 2]);
    let result = multisig
        .commit_tree(&req, &responses, &source, &destination, CommitOptions::default())
        .await
        .unwrap();

    assert_eq!(result.metadata.batch_size, 1);
    assert_eq!(result.content.batch_size, 1);
    assert_eq!(destination.metadata.entries(), entries("/file", 2));
    assert_eq!(destination.content.entries(), entries("blob", 1));
}

#[tokio::test]
async fn test_tree_empty_destination_still_needs_first_commit_flag() {
    let signers = TestSigners::new("drive", 3);
    let multisig = multisig(&signers);
    let source = seeded_tree(identity(0x11), entries("/file", 1), entries("blob", 1));
    let destination = seeded_tree(multisig.identity(), Vec::new(), Vec::new());

    let req = multisig
        .request_tree(&source, 1, None, RequestOptions::default())
        .await
        .unwrap();
    let responses = signers.responses(&req, &[0, 1]);
    assert_matches!(
        multisig
            .commit_tree(&req, &responses, &source, &destination, CommitOptions::default())
            .await,
        Err(MultisigError::InvalidState { .. })
    );
    assert_eq!(destination.content.length().await.unwrap(), 0);
}
