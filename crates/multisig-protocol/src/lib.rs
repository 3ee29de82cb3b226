//! Multisig Protocol - quorum-signed replication of append-only logs
//!
//! A coordinator builds a [`SigningRequest`](multisig_core::SigningRequest)
//! naming a source log, its target length and tree hash. Signers answer with
//! responses bound to the destination identity. Once a quorum of distinct
//! valid responses is collected, [`Multisig::commit`] copies the missing
//! entries from the source into the destination, but only while the source
//! still matches what was signed.
//!
//! Trees (a metadata log plus a content log) follow the same path through
//! [`Multisig::commit_tree`], with both logs covered by one request.

#![forbid(unsafe_code)]

pub mod builder;
pub mod config;
pub mod executor;
pub mod planner;
pub mod verify;

pub use builder::{build_request, build_tree_request};
pub use config::{CommitOptions, ProtocolConfig, RequestOptions, DEFAULT_SOURCE_TIMEOUT};
pub use executor::{CommitResult, Multisig, Outcome, Review, TreeCommitResult, TreeReview};
pub use planner::{plan_batch, Batch, LogPlan};
pub use verify::{tally, verify_response, Rejection, SignerOutcome, Tally};
