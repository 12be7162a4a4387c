//! The ingestion job: collect from every source, then write the merged batch.
//!
//! Source failures never fail the job; they are recorded in the summary. Only
//! a write error returned under the strict policy does.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use postsync_core::AppConfig;
use postsync_sources::{collect_posts, default_sources, PostSource, Settlement, SourceOutcome};
use postsync_store::{PostStore, RestStore, StoreWriter, WriteOutcome};

/// What one job run did, for logging and tests.
#[derive(Debug, Clone)]
pub(crate) struct JobSummary {
    pub(crate) outcomes: Vec<SourceOutcome>,
    /// Posts in the merged batch.
    pub(crate) fetched: usize,
    /// `None` when the batch was empty or the run was a dry run.
    pub(crate) write: Option<WriteOutcome>,
}

impl JobSummary {
    pub(crate) fn failed_sources(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }
}

/// Runs one job from configuration: builds the store client and the default
/// sources, then delegates to [`run_job`].
///
/// # Errors
///
/// Returns an error if the store client or a source cannot be constructed, or
/// if the write fails under the strict policy.
pub(crate) async fn run_from_config(config: &AppConfig, dry_run: bool) -> anyhow::Result<JobSummary> {
    let store: Arc<dyn PostStore> = Arc::new(
        RestStore::new(
            &config.store_url,
            &config.store_key,
            &config.store_table,
            config.request_timeout_secs,
        )
        .context("failed to build store client")?,
    );
    let sources = default_sources(config).context("failed to build source adapters")?;
    let writer = StoreWriter::new(store, config.write_policy);

    run_job(
        &sources,
        &writer,
        Duration::from_secs(config.source_timeout_secs),
        dry_run,
    )
    .await
}

/// Collects from `sources` and hands a non-empty batch to `writer`.
///
/// When `dry_run` is `true` the batch is summarized on stdout and nothing is
/// written.
///
/// # Errors
///
/// Returns an error only if [`StoreWriter::write`] does.
pub(crate) async fn run_job(
    sources: &[Box<dyn PostSource>],
    writer: &StoreWriter,
    per_source_timeout: Duration,
    dry_run: bool,
) -> anyhow::Result<JobSummary> {
    tracing::info!(
        sources = sources.len(),
        policy = %writer.policy(),
        dry_run,
        "starting ingestion job"
    );

    let collection = collect_posts(sources, per_source_timeout).await;
    let mut summary = JobSummary {
        fetched: collection.len(),
        outcomes: collection.outcomes.clone(),
        write: None,
    };

    if dry_run {
        print_dry_run(&summary);
        return Ok(summary);
    }

    if collection.is_empty() {
        tracing::info!(
            failed_sources = summary.failed_sources(),
            "no new posts; skipping store write"
        );
        return Ok(summary);
    }

    let outcome = writer
        .write(&collection.posts)
        .await
        .with_context(|| format!("failed to write {} post(s) to the store", collection.len()))?;
    summary.write = Some(outcome);

    tracing::info!(
        fetched = summary.fetched,
        failed_sources = summary.failed_sources(),
        attempted = outcome.attempted,
        rows_affected = ?outcome.rows_affected,
        "ingestion job complete"
    );
    Ok(summary)
}

fn print_dry_run(summary: &JobSummary) {
    println!("dry-run: collected {} post(s); nothing written", summary.fetched);
    for outcome in &summary.outcomes {
        match &outcome.settlement {
            Settlement::Succeeded { count } => {
                println!("  {:<9} {count} post(s)", outcome.platform.as_str());
            }
            Settlement::Failed { reason } => {
                println!("  {:<9} failed: {reason}", outcome.platform.as_str());
            }
        }
    }
}

#[cfg(test)]
#[path = "job_test.rs"]
mod tests;
