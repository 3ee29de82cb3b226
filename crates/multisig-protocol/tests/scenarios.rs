//! End-to-end request, verify and commit against in-memory logs

use assert_matches::assert_matches;
use multisig_core::{tree_hash, MultisigError, SigningRequest, Token};
use multisig_log::{AppendLog, MemoryLog};
use multisig_protocol::{CommitOptions, Multisig, ProtocolConfig, RequestOptions};
use multisig_testkit::{entries, identity, seeded_log, Fault, FaultyLog, TestSigners};
use std::time::Duration;

struct Setup {
    signers: TestSigners,
    multisig: Multisig,
    source: MemoryLog,
    destination: MemoryLog,
}

/// Three signers, a five-entry source and a destination holding `have` entries
fn setup(have: usize) -> Setup {
    let signers = TestSigners::new("ns1", 3);
    let config = ProtocolConfig::default().with_source_timeout(Duration::from_millis(50));
    let multisig = Multisig::new(signers.set(), config).unwrap();
    let source = seeded_log(identity(0xaa), entries("c", 5));
    let destination = seeded_log(multisig.identity(), entries("c", have));
    Setup {
        signers,
        multisig,
        source,
        destination,
    }
}

async fn request(setup: &Setup, length: u64) -> SigningRequest {
    setup
        .multisig
        .request(&setup.source, length, RequestOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_quorum_commit_appends_missing_entries() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 2]);

    let result = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap();

    assert_eq!(result.applied_length, 4);
    assert_eq!(result.batch_size, 2);
    assert!(!result.forced);
    assert_eq!(s.destination.entries(), entries("c", 4));
    assert_eq!(
        s.destination.tree_hash_at(4).await.unwrap(),
        req.content_hash()
    );
}

#[tokio::test]
async fn test_single_response_is_insufficient() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0]);

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MultisigError::InsufficientQuorum {
            valid: 1,
            required: 2
        }
    );
    assert_eq!(s.destination.length().await.unwrap(), 2);
}

#[tokio::test]
async fn test_rewritten_source_needs_force() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    s.source.rewrite(2, b"rewritten".to_vec()).unwrap();

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::HashMismatch { length: 4, .. });
    assert_eq!(s.destination.length().await.unwrap(), 2);

    let forced = CommitOptions {
        force: true,
        ..CommitOptions::default()
    };
    let result = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, forced)
        .await
        .unwrap();
    assert!(result.forced);
    assert_eq!(result.applied_length, 4);
    assert_eq!(s.destination.read_range(2, 3).await.unwrap(), vec![b"rewritten".to_vec()]);
}

#[tokio::test]
async fn test_replayed_commit_is_noop() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[1, 2]);

    s.multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap();
    let replay = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap();

    assert_eq!(replay.applied_length, 4);
    assert_eq!(replay.batch_size, 0);
    assert_eq!(s.destination.entries(), entries("c", 4));
}

#[tokio::test]
async fn test_first_commit_needs_skip_target_checks() {
    let s = setup(0);
    let req = request(&s, 3).await;
    let responses = s.signers.responses(&req, &[0, 1]);

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::InvalidState { .. });

    let first = CommitOptions {
        skip_target_checks: true,
        ..CommitOptions::default()
    };
    let result = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, first)
        .await
        .unwrap();
    assert_eq!(result.batch_size, 3);
}

#[tokio::test]
async fn test_review_does_not_write() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1, 2]);

    let review = s
        .multisig
        .verify(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap();

    assert_eq!(review.identity, s.multisig.identity());
    assert_eq!(review.quorum.valid, 3);
    assert_eq!(review.quorum.required, 2);
    assert_eq!((review.log.batch.start, review.log.batch.end), (2, 4));
    assert_eq!(review.log.destination.length, 2);
    assert_eq!(review.log.source.length, 5);
    assert_eq!(s.destination.length().await.unwrap(), 2);

    let json = serde_json::to_value(&review).unwrap();
    assert_eq!(json["log"]["batch"]["entries"][0], hex_of(b"c2"));
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[tokio::test]
async fn test_tokens_survive_text_transport() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let text = req.to_token_string().unwrap();
    let decoded = SigningRequest::from_token_string(&text).unwrap();

    let responses = s.signers.responses(&decoded, &[0, 1]);
    let responses: Vec<_> = responses
        .iter()
        .map(|r| multisig_core::SigningResponse::from_token_string(&r.to_token_string().unwrap()))
        .collect::<Result<_, _>>()
        .unwrap();

    let result = s
        .multisig
        .commit(&req, &responses, &s.source, &s.destination, CommitOptions::default())
        .await
        .unwrap();
    assert_eq!(result.applied_length, 4);
}

#[tokio::test]
async fn test_request_for_other_source_rejected() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    let other = seeded_log(identity(0xbb), entries("c", 5));

    let err = s
        .multisig
        .commit(&req, &responses, &other, &s.destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::InvalidState { .. });
}

#[tokio::test]
async fn test_foreign_destination_rejected() {
    let s = setup(2);
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    let foreign = seeded_log(identity(0xcc), entries("c", 2));

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &foreign, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::Config { .. });
}

#[tokio::test]
async fn test_source_behind_signed_length_times_out() {
    let s = setup(1);
    let short = seeded_log(s.source.identity(), entries("c", 2));
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);

    let err = s
        .multisig
        .commit(&req, &responses, &short, &s.destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::Timeout { .. });
}

#[tokio::test]
async fn test_torn_append_detected() {
    let s = setup(1);
    let destination = FaultyLog::new(seeded_log(s.multisig.identity(), entries("c", 1)));
    let req = request(&s, 5).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    destination.fail_next(Fault::Torn);

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::PartialApplyDetected { .. });
}

#[tokio::test]
async fn test_rejected_append_is_storage_error() {
    let s = setup(1);
    let destination = FaultyLog::new(seeded_log(s.multisig.identity(), entries("c", 1)));
    let req = request(&s, 3).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    destination.fail_next(Fault::Reject);

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::Storage { .. });
    assert_eq!(destination.length().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_identical_commit_is_noop() {
    let s = setup(2);
    let destination = FaultyLog::new(seeded_log(s.multisig.identity(), entries("c", 2)));
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    destination.fail_next(Fault::Race(entries("c", 4)[2..].to_vec()));

    let result = s
        .multisig
        .commit(&req, &responses, &s.source, &destination, CommitOptions::default())
        .await
        .unwrap();
    assert_eq!(result.applied_length, 4);
    assert_eq!(result.batch_size, 0);
    assert_eq!(destination.inner().entries(), entries("c", 4));
}

#[tokio::test]
async fn test_concurrent_divergent_commit_is_invalid_state() {
    let s = setup(2);
    let destination = FaultyLog::new(seeded_log(s.multisig.identity(), entries("c", 2)));
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    destination.fail_next(Fault::Race(vec![b"intruder".to_vec()]));

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MultisigError::InvalidState { .. });
    assert_eq!(destination.length().await.unwrap(), 3);
    assert_ne!(
        destination.tree_hash_at(3).await.unwrap(),
        tree_hash(&entries("c", 3))
    );
}

#[tokio::test]
async fn test_partial_concurrent_commit_converges_on_rerun() {
    let s = setup(2);
    let destination = FaultyLog::new(seeded_log(s.multisig.identity(), entries("c", 2)));
    let req = request(&s, 4).await;
    let responses = s.signers.responses(&req, &[0, 1]);
    // Another writer lands the correct next entry but stops short of the target.
    destination.fail_next(Fault::Race(entries("c", 3)[2..].to_vec()));

    let err = s
        .multisig
        .commit(&req, &responses, &s.source, &destination, CommitOptions::default())
        .await
        .unwrap_err();
    assert_matches!(&err, MultisigError::InvalidState { message } if message.contains("rerun"));
    assert_eq!(destination.length().await.unwrap(), 3);

    let result = s
        .multisig
        .commit(&req, &responses, &s.source, &destination, CommitOptions::default())
        .await
        .unwrap();
    assert_eq!(result.applied_length, 4);
    assert_eq!(result.batch_size, 1);
    assert_eq!(destination.inner().entries(), entries("c", 4));
}
