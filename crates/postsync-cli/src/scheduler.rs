//! `postsync schedule`: rerun the job on a cron expression until shutdown.

use std::sync::Arc;

use anyhow::Context;
use postsync_core::AppConfig;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::job;

/// Registers the ingestion job on `config.schedule` and blocks until ctrl-c or
/// SIGTERM.
///
/// A failed scheduled run is logged; the next tick runs regardless.
///
/// # Errors
///
/// Returns an error if the cron expression is invalid or the scheduler cannot
/// be started or stopped.
pub(crate) async fn run_schedule(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new()
        .await
        .context("failed to create scheduler")?;

    let job_config = Arc::clone(&config);
    let job = Job::new_async(config.schedule.as_str(), move |_uuid, _lock| {
        let config = Arc::clone(&job_config);

        Box::pin(async move {
            tracing::info!("scheduler: starting ingestion run");
            match job::run_from_config(&config, false).await {
                Ok(summary) => tracing::info!(
                    fetched = summary.fetched,
                    failed_sources = summary.failed_sources(),
                    "scheduler: ingestion run complete"
                ),
                Err(e) => tracing::error!(
                    error = %format!("{e:#}"),
                    "scheduler: ingestion run failed"
                ),
            }
        })
    })
    .with_context(|| format!("invalid schedule {:?}", config.schedule))?;

    scheduler.add(job).await.context("failed to register job")?;
    scheduler.start().await.context("failed to start scheduler")?;
    tracing::info!(schedule = %config.schedule, "scheduler started");

    shutdown_signal().await;

    scheduler
        .shutdown()
        .await
        .context("failed to stop scheduler")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
