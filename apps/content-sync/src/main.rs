//! # Folio Content Sync
//!
//! One-shot reconciliation of the content directory into the post store.
//! Exit status: 0 on success (or a tolerated abort), 1 on a fatal error,
//! 2 when some documents failed and failures are not tolerated.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::ports::SystemClock;
use folio_core::services::{ContentSynchronizer, FailurePolicy, SyncReport};
use folio_infra::{DatabaseConfig, DatabaseConnections, FsContentStore, postgres_repositories};

use cli::Cli;

const DEFAULT_FILTER: &str = "info,content_sync=debug,folio_core=debug,sqlx=warn";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let policy = cli.failure_policy();

    let report = match connect(&cli).await {
        Ok(connections) => {
            let repos = postgres_repositories(connections.main.clone());
            let synchronizer = ContentSynchronizer::new(repos, Arc::new(SystemClock));
            let source = FsContentStore::new(&cli.content_dir);

            tracing::info!(dir = %cli.content_dir.display(), ?policy, "Synchronizing content");
            synchronizer
                .run_with_policy(&source, policy)
                .await
                .context("content synchronization failed")?
        }
        Err(e) if policy == FailurePolicy::Tolerate => {
            tracing::warn!(
                sync_aborted = true,
                error = %format!("{e:#}"),
                "Skipping content synchronization; continuing because failures are tolerated"
            );
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(ExitCode::from(exit_status(&report, policy)))
}

async fn connect(cli: &Cli) -> Result<DatabaseConnections> {
    let url = cli
        .database_url
        .clone()
        .context("DATABASE_URL is not set")?;

    let mut config = DatabaseConfig::new(url);
    config.max_connections = cli.max_connections;
    config.min_connections = 1;

    DatabaseConnections::init(&config)
        .await
        .context("failed to connect to the post store")
}

fn exit_status(report: &SyncReport, policy: FailurePolicy) -> u8 {
    if report.is_partial() && policy == FailurePolicy::Propagate {
        tracing::warn!(failures = report.failures(), "Synchronization finished with failures");
        2
    } else {
        0
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}
