//! CLI for running the job scrapers.
//!
//! Every command prints a JSON response on stdout. Failures print
//! `{"success": false, ...}` and exit non-zero.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use job_scraper::cron::{run_scheduled, start_cron};
use job_scraper::{ChromiumLauncher, Config, Engine, JobSource, PostgresStore, Scheduler};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "job-scraper")]
#[command(about = "Scrape peer-support job listings from public job boards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every scraper once, then archive old jobs
    Run,

    /// Run a single source's scraper
    Scrape { source: JobSource },

    /// Deactivate jobs older than the given number of days
    Archive {
        #[arg(long)]
        days: Option<u32>,
    },

    /// Print job table statistics
    Stats,

    /// Run on the configured cron schedule until interrupted
    Schedule,
}

#[derive(Serialize)]
struct Response<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl<T: Serialize> Response<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

impl Response<()> {
    fn err(error: &anyhow::Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(format!("{:#}", error)),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct ArchiveResponse {
    archived_jobs: u64,
    days_old: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_scraper=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            print_json(&Response::err(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Connecting to database...");
    let store = PostgresStore::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    store.migrate().await.context("Failed to run migrations")?;

    let engine = Engine::new(Arc::new(ChromiumLauncher::new()), Arc::new(store))
        .with_options(config.engine_options());
    let scheduler = Scheduler::with_default_sources(engine);

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    match command {
        Commands::Run => {
            let report = run_scheduled(&scheduler, config.archive_after_days, &cancel)
                .await
                .context("Failed to archive old jobs")?;
            print_json(&Response::ok(report));
        }
        Commands::Scrape { source } => {
            let result = scheduler.scrape(source, &cancel).await?;
            print_json(&Response::ok(result));
        }
        Commands::Archive { days } => {
            let days_old = days.unwrap_or(config.archive_after_days);
            let archived_jobs = scheduler.archive_old_jobs(days_old).await?;
            print_json(&Response::ok(ArchiveResponse {
                archived_jobs,
                days_old,
            }));
        }
        Commands::Stats => {
            let stats = scheduler.stats().await?;
            print_json(&Response::ok(stats));
        }
        Commands::Schedule => {
            let mut cron = start_cron(
                Arc::new(scheduler),
                &config.schedule,
                config.archive_after_days,
                cancel.clone(),
            )
            .await
            .context("Failed to start scheduled scraping")?;

            cancel.cancelled().await;
            tracing::info!("Shutting down scheduler");
            cron.shutdown().await?;
        }
    }

    Ok(())
}

/// Cancel in-flight work on Ctrl-C.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

fn print_json<T: Serialize>(response: &T) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize response: {}", e),
    }
}
