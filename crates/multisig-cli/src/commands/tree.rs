//! Two-log tree commands
//!
//! The configured source key names the source tree's metadata log; its
//! content log is the companion identity.

use multisig_log::AppendLog;
use multisig_protocol::{CommitOptions, RequestOptions, TreeCommitResult, TreeReview};
use tracing::info;

use super::common::{decode_request, decode_responses, Context, RequestOutput};

/// Build a request covering both logs of the configured source tree
pub async fn request(
    ctx: &Context,
    metadata_length: u64,
    content_length: Option<u64>,
    force: bool,
) -> anyhow::Result<RequestOutput> {
    let source = ctx.store.existing_tree(ctx.source()?).await?;
    info!(
        source = %source.identity(),
        metadata_length,
        ?content_length,
        force,
        "Requesting drive signatures"
    );
    let request = ctx
        .multisig
        .request_tree(&source, metadata_length, content_length, RequestOptions { force })
        .await?;
    RequestOutput::new(&ctx.multisig, request)
}

/// Review what a tree commit would apply
pub async fn verify(
    ctx: &Context,
    request: &str,
    responses: &[String],
) -> anyhow::Result<TreeReview> {
    let request = decode_request(request)?;
    let responses = decode_responses(responses)?;
    let source = ctx.store.existing_tree(ctx.source()?).await?;
    let destination = ctx.store.tree(ctx.multisig.identity());
    let options = CommitOptions {
        skip_target_checks: destination.metadata.length().await? == 0,
        ..CommitOptions::review()
    };
    Ok(ctx
        .multisig
        .verify_tree(&request, &responses, &source, &destination, options)
        .await?)
}

/// Commit a signed tree request
pub async fn commit(
    ctx: &Context,
    request: &str,
    responses: &[String],
    first_commit: bool,
    force: bool,
) -> anyhow::Result<TreeCommitResult> {
    let request = decode_request(request)?;
    let responses = decode_responses(responses)?;
    let source = ctx.store.existing_tree(ctx.source()?).await?;
    let destination = ctx.store.tree(ctx.multisig.identity());
    let options = CommitOptions {
        dry_run: false,
        skip_target_checks: first_commit,
        force,
    };
    Ok(ctx
        .multisig
        .commit_tree(&request, &responses, &source, &destination, options)
        .await?)
}
