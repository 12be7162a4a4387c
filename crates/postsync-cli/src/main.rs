mod job;
mod recent;
mod scheduler;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "postsync")]
#[command(about = "Collect social posts and upsert them into the posts store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the ingestion job once (the default when no command is given).
    Run {
        /// Collect and summarize without writing to the store.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the newest stored posts.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run the ingestion job on `POSTSYNC_SCHEDULE` until interrupted.
    Schedule,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = postsync_core::load_app_config();
    let log_level = config
        .as_ref()
        .map_or("info", |c| c.log_level.as_str())
        .to_owned();
    if let Err(e) = init_tracing(&log_level) {
        eprintln!("failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let config = match config {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let result = match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => job::run_from_config(&config, dry_run).await.map(|_| ()),
        Commands::Recent { limit } => recent::run_recent(&config, limit).await,
        Commands::Schedule => scheduler::run_schedule(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "postsync failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}
