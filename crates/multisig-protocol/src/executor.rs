//! Quorum-gated verification and commit
//!
//! [`Multisig`] ties a signer set to its configuration and runs the full
//! pipeline for single logs and two-log trees:
//!
//! 1. Check the request against the logs it names
//! 2. Tally responses and require the quorum
//! 3. Plan the batch for every destination log
//! 4. Either report the plan (dry run) or append it and verify the result
//!
//! Nothing is written until every check and every plan has succeeded.

use multisig_core::{
    derive_capability, Identity, LogTarget, MultisigError, Result, SignerSecret, SignerSet,
    SigningRequest, SigningResponse,
};
use multisig_log::{AppendLog, LogError, LogTree};
use serde::Serialize;
use tracing::{info, warn};

use crate::builder::{build_request, build_tree_request};
use crate::config::{CommitOptions, ProtocolConfig, RequestOptions};
use crate::planner::{plan_batch, Batch, LogPlan};
use crate::verify::{tally, Tally};

/// What a verification would apply to a single log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    /// Destination identity
    pub identity: Identity,
    /// Observed states and planned batch
    pub log: LogPlan,
    /// Quorum tally
    pub quorum: Tally,
    /// Whether a force override was in effect
    pub forced: bool,
}

/// What a verification would apply to a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeReview {
    /// Destination tree identity (its metadata log)
    pub identity: Identity,
    /// Metadata log plan
    pub metadata: LogPlan,
    /// Content log plan
    pub content: LogPlan,
    /// Quorum tally
    pub quorum: Tally,
    /// Whether a force override was in effect
    pub forced: bool,
}

/// Result of committing to one log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    /// Destination identity
    pub identity: Identity,
    /// Destination length after the commit
    pub applied_length: u64,
    /// Entries this commit appended; zero for a replay
    pub batch_size: usize,
    /// Whether a force override was in effect
    pub forced: bool,
}

/// Result of committing to a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeCommitResult {
    /// Destination tree identity (its metadata log)
    pub identity: Identity,
    /// Metadata log commit
    pub metadata: CommitResult,
    /// Content log commit
    pub content: CommitResult,
    /// Whether a force override was in effect
    pub forced: bool,
}

/// Result of [`Multisig::execute`]: a review for dry runs, otherwise a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Outcome<R, C> {
    /// Dry run; nothing was written
    Reviewed(R),
    /// The batch was appended
    Committed(C),
}

/// A signer set and the settings its operations run with
#[derive(Debug, Clone)]
pub struct Multisig {
    signers: SignerSet,
    config: ProtocolConfig,
    quorum: usize,
}

impl Multisig {
    /// Bind a signer set to a configuration, validating the quorum
    pub fn new(signers: SignerSet, config: ProtocolConfig) -> Result<Self> {
        let quorum = config.effective_quorum(signers.keys().len())?;
        Ok(Self {
            signers,
            config,
            quorum,
        })
    }

    /// Signer set
    pub fn signers(&self) -> &SignerSet {
        &self.signers
    }

    /// Destination identity
    pub fn identity(&self) -> Identity {
        self.signers.identity()
    }

    /// Distinct valid signers a commit requires
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Build a request replicating a single log
    pub async fn request<L: AppendLog + ?Sized>(
        &self,
        source: &L,
        length: u64,
        options: RequestOptions,
    ) -> Result<SigningRequest> {
        build_request(source, length, options, self.config.source_timeout).await
    }

    /// Build a request replicating a tree
    pub async fn request_tree<L: AppendLog>(
        &self,
        source: &LogTree<L>,
        metadata_length: u64,
        content_length: Option<u64>,
        options: RequestOptions,
    ) -> Result<SigningRequest> {
        build_tree_request(
            source,
            metadata_length,
            content_length,
            options,
            self.config.source_timeout,
        )
        .await
    }

    /// Answer a request with a signer's secret seed
    pub fn respond(
        &self,
        secret: &SignerSecret,
        request: &SigningRequest,
    ) -> Result<SigningResponse> {
        derive_capability(secret, self.signers.namespace(), self.signers.keys())?.sign(request)
    }

    /// Count the valid responses to a request
    pub fn tally(&self, request: &SigningRequest, responses: &[SigningResponse]) -> Tally {
        tally(request, responses, &self.signers, self.quorum)
    }

    /// Review or commit a single-log request
    pub async fn execute<S, D>(
        &self,
        request: &SigningRequest,
        responses: &[SigningResponse],
        source: &S,
        destination: &D,
        options: CommitOptions,
    ) -> Result<Outcome<Review, CommitResult>>
    where
        S: AppendLog + ?Sized,
        D: AppendLog + ?Sized,
    {
        if request.is_tree() {
            return Err(MultisigError::invalid_state(
                "tree request cannot be committed to a single log",
            ));
        }
        check_target(&request.target)?;
        check_source(request, source.identity())?;
        check_destination(destination.identity(), self.identity())?;

        let quorum = self.tally(request, responses);
        quorum.require()?;

        let plan = plan_batch(
            source,
            destination,
            &request.target,
            options,
            self.config.source_timeout,
        )
        .await?;

        if options.dry_run {
            info!(
                destination = %plan.destination.identity,
                start = plan.batch.start,
                end = plan.batch.end,
                valid = quorum.valid,
                required = quorum.required,
                "Reviewed signed request"
            );
            return Ok(Outcome::Reviewed(Review {
                identity: plan.destination.identity,
                log: plan,
                quorum,
                forced: options.force,
            }));
        }

        let result = apply(destination, &plan.batch).await?;
        log_commit(&result);
        Ok(Outcome::Committed(result))
    }

    /// Run a single-log request as a dry run
    pub async fn verify<S, D>(
        &self,
        request: &SigningRequest,
        responses: &[SigningResponse],
        source: &S,
        destination: &D,
        options: CommitOptions,
    ) -> Result<Review>
    where
        S: AppendLog + ?Sized,
        D: AppendLog + ?Sized,
    {
        let options = CommitOptions {
            dry_run: true,
            ..options
        };
        match self
            .execute(request, responses, source, destination, options)
            .await?
        {
            Outcome::Reviewed(review) => Ok(review),
            Outcome::Committed(_) => Err(MultisigError::invalid_state("dry run wrote to log")),
        }
    }

    /// Commit a single-log request
    pub async fn commit<S, D>(
        &self,
        request: &SigningRequest,
        responses: &[SigningResponse],
        source: &S,
        destination: &D,
        options: CommitOptions,
    ) -> Result<CommitResult>
    where
        S: AppendLog + ?Sized,
        D: AppendLog + ?Sized,
    {
        let options = CommitOptions {
            dry_run: false,
            ..options
        };
        match self
            .execute(request, responses, source, destination, options)
            .await?
        {
            Outcome::Committed(result) => Ok(result),
            Outcome::Reviewed(_) => Err(MultisigError::invalid_state("commit did not write")),
        }
    }

    /// Review or commit a tree request
    ///
    /// Both logs are planned before either is written. The content log is
    /// appended first so metadata never references content the destination
    /// does not hold.
    pub async fn execute_tree<S, D>(
        &self,
        request: &SigningRequest,
        responses: &[SigningResponse],
        source: &LogTree<S>,
        destination: &LogTree<D>,
        options: CommitOptions,
    ) -> Result<Outcome<TreeReview, TreeCommitResult>>
    where
        S: AppendLog,
        D: AppendLog,
    {
        let content_target = request.content.ok_or_else(|| {
            MultisigError::invalid_state("single-log request cannot be committed to a tree")
        })?;
        check_target(&request.target)?;
        check_source(request, source.identity())?;
        let tree = self.signers.tree_identity();
        check_destination(destination.metadata.identity(), tree.metadata)?;
        check_destination(destination.content.identity(), tree.content)?;

        let quorum = self.tally(request, responses);
        quorum.require()?;

        let timeout = self.config.source_timeout;
        let metadata = plan_batch(
            &source.metadata,
            &destination.metadata,
            &request.target,
            options,
            timeout,
        )
        .await?;
        // A continued metadata log vouches for its content log, which a prior
        // commit may have left empty.
        let content_options = CommitOptions {
            skip_target_checks: options.skip_target_checks || metadata.destination.length > 0,
            ..options
        };
        let content = plan_batch(
            &source.content,
            &destination.content,
            &content_target,
            content_options,
            timeout,
        )
        .await?;

        if options.dry_run {
            info!(
                destination = %tree.metadata,
                metadata_batch = metadata.batch.len(),
                content_batch = content.batch.len(),
                valid = quorum.valid,
                required = quorum.required,
                "Reviewed signed tree request"
            );
            return Ok(Outcome::Reviewed(TreeReview {
                identity: tree.metadata,
                metadata,
                content,
                quorum,
                forced: options.force,
            }));
        }

        let content_result = apply(&destination.content, &content.batch).await?;
        log_commit(&content_result);

        let metadata_result = match apply(&destination.metadata, &metadata.batch).await {
            Ok(result) => result,
            Err(err) if content_result.batch_size > 0 => {
                return Err(MultisigError::partial_apply(format!(
                    "content log {} advanced to {} but metadata commit failed: {err}",
                    content_result.identity, content_result.applied_length
                )));
            }
            Err(err) => return Err(err),
        };
        log_commit(&metadata_result);

        Ok(Outcome::Committed(TreeCommitResult {
            identity: tree.metadata,
            metadata: metadata_result,
            content: content_result,
            forced: options.force,
        }))
    }

    /// Run a tree request as a dry run
    pub async fn verify_tree<S, D>(
        &self,
        request: &SigningRequest,
        responses: &[SigningResponse],
        source: &LogTree<S>,
        destination: &LogTree<D>,
        options: CommitOptions,
    ) -> Result<TreeReview>
    where
        S: AppendLog,
        D: AppendLog,
    {
        let options = CommitOptions {
            dry_run: true,
            ..options
        };
        match self
            .execute_tree(request, responses, source, destination, options)
            .await?
        {
            Outcome::Reviewed(review) => Ok(review),
            Outcome::Committed(_) => Err(MultisigError::invalid_state("dry run wrote to tree")),
        }
    }

    /// Commit a tree request
    pub async fn commit_tree<S, D>(
        &self,
        request: &SigningRequest,
        responses: &[SigningResponse],
        source: &LogTree<S>,
        destination: &LogTree<D>,
        options: CommitOptions,
    ) -> Result<TreeCommitResult>
    where
        S: AppendLog,
        D: AppendLog,
    {
        let options = CommitOptions {
            dry_run: false,
            ..options
        };
        match self
            .execute_tree(request, responses, source, destination, options)
            .await?
        {
            Outcome::Committed(result) => Ok(result),
            Outcome::Reviewed(_) => Err(MultisigError::invalid_state("commit did not write")),
        }
    }
}

fn check_target(target: &LogTarget) -> Result<()> {
    if target.length == 0 {
        return Err(MultisigError::invalid_length("target length must be positive"));
    }
    Ok(())
}

fn check_source(request: &SigningRequest, source: Identity) -> Result<()> {
    if request.source != source {
        return Err(MultisigError::invalid_state(format!(
            "request names source {} but log {source} was supplied",
            request.source
        )));
    }
    Ok(())
}

fn check_destination(actual: Identity, expected: Identity) -> Result<()> {
    if actual != expected {
        return Err(MultisigError::config(format!(
            "destination {actual} is not the signer set's log {expected}"
        )));
    }
    Ok(())
}

fn log_commit(result: &CommitResult) {
    if result.forced {
        warn!(
            destination = %result.identity,
            applied_length = result.applied_length,
            batch_size = result.batch_size,
            "Committed batch with force override"
        );
    } else {
        info!(
            destination = %result.identity,
            applied_length = result.applied_length,
            batch_size = result.batch_size,
            "Committed batch"
        );
    }
}

/// Whether `destination` holds exactly the planned batch
async fn holds_batch<D: AppendLog + ?Sized>(destination: &D, batch: &Batch) -> Result<bool> {
    if destination.length().await? < batch.end {
        return Ok(false);
    }
    if destination.read_range(batch.start, batch.end).await? != batch.entries {
        return Ok(false);
    }
    // A forced batch may sit on a diverged prefix, so only the appended
    // range can be compared.
    if !batch.forced && destination.tree_hash_at(batch.end).await? != batch.tree_hash {
        return Ok(false);
    }
    Ok(true)
}

/// Append a planned batch and confirm the destination reflects it
async fn apply<D: AppendLog + ?Sized>(destination: &D, batch: &Batch) -> Result<CommitResult> {
    let identity = destination.identity();
    let result = |batch_size| CommitResult {
        identity,
        applied_length: batch.end,
        batch_size,
        forced: batch.forced,
    };

    if batch.is_empty() {
        info!(destination = %identity, length = batch.end, "Destination already at target");
        return Ok(result(0));
    }

    match destination.append(batch.start, batch.entries.clone()).await {
        Ok(_) => {}
        Err(LogError::LengthConflict { actual, .. }) => {
            if holds_batch(destination, batch).await? {
                info!(
                    destination = %identity,
                    length = actual,
                    "Concurrent writer already applied the batch"
                );
                return Ok(result(0));
            }
            return Err(MultisigError::invalid_state(format!(
                "destination {identity} moved from {} to {actual} during commit; \
                 rerun the commit to apply the remaining range",
                batch.start
            )));
        }
        Err(err) => return Err(err.into()),
    }

    let applied = holds_batch(destination, batch).await.map_err(|e| {
        MultisigError::partial_apply(format!("could not re-read destination {identity}: {e}"))
    })?;
    if !applied {
        return Err(MultisigError::partial_apply(format!(
            "destination {identity} does not hold entries {}..{} after append",
            batch.start, batch.end
        )));
    }

    Ok(result(batch.len()))
}
