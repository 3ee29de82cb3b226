//! Single-log commands

use multisig_log::AppendLog;
use multisig_protocol::{CommitOptions, CommitResult, RequestOptions, Review};
use tracing::info;

use super::common::{decode_request, decode_responses, Context, RequestOutput};

/// Build a request for the configured source log
pub async fn request(ctx: &Context, length: u64, force: bool) -> anyhow::Result<RequestOutput> {
    let source = ctx.store.existing_log(ctx.source()?).await?;
    info!(source = %source.identity(), length, force, "Requesting core signatures");
    let request = ctx
        .multisig
        .request(&source, length, RequestOptions { force })
        .await?;
    RequestOutput::new(&ctx.multisig, request)
}

/// Review what a commit would apply
pub async fn verify(ctx: &Context, request: &str, responses: &[String]) -> anyhow::Result<Review> {
    let request = decode_request(request)?;
    let responses = decode_responses(responses)?;
    let source = ctx.store.existing_log(ctx.source()?).await?;
    let destination = ctx.store.log(ctx.multisig.identity());
    let options = CommitOptions {
        skip_target_checks: destination.length().await? == 0,
        ..CommitOptions::review()
    };
    Ok(ctx
        .multisig
        .verify(&request, &responses, &source, &destination, options)
        .await?)
}

/// Commit a signed request to the destination log
pub async fn commit(
    ctx: &Context,
    request: &str,
    responses: &[String],
    first_commit: bool,
    force: bool,
) -> anyhow::Result<CommitResult> {
    let request = decode_request(request)?;
    let responses = decode_responses(responses)?;
    let source = ctx.store.existing_log(ctx.source()?).await?;
    let destination = ctx.store.log(ctx.multisig.identity());
    let options = CommitOptions {
        dry_run: false,
        skip_target_checks: first_commit,
        force,
    };
    Ok(ctx
        .multisig
        .commit(&request, &responses, &source, &destination, options)
        .await?)
}
