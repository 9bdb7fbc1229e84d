//! Scheduled trigger: scrape everything, then archive.
//!
//! The same [`run_scheduled`] body backs the cron job and the one-shot
//! `job-scraper run` command.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::error::StoreResult;
use crate::scheduler::Scheduler;
use crate::types::SchedulerResult;

/// What one scheduled run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scraper_result: SchedulerResult,
    pub archived_jobs: u64,
    pub timestamp: DateTime<Utc>,
}

/// Run every scraper, then archive postings older than `archive_after_days`.
pub async fn run_scheduled(
    scheduler: &Scheduler,
    archive_after_days: u32,
    cancel: &CancellationToken,
) -> StoreResult<RunReport> {
    let scraper_result = scheduler.run_all_scrapers(cancel).await;
    let archived_jobs = scheduler.archive_old_jobs(archive_after_days).await?;
    Ok(RunReport {
        scraper_result,
        archived_jobs,
        timestamp: Utc::now(),
    })
}

/// Start the cron job on `schedule` (six-field cron, seconds first).
pub async fn start_cron(
    scheduler: Arc<Scheduler>,
    schedule: &str,
    archive_after_days: u32,
    cancel: CancellationToken,
) -> Result<JobScheduler> {
    let cron = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let scheduler = Arc::clone(&scheduler);
        let cancel = cancel.clone();
        Box::pin(async move {
            if cancel.is_cancelled() {
                return;
            }
            tracing::info!("Running scheduled scrape");
            match run_scheduled(&scheduler, archive_after_days, &cancel).await {
                Ok(report) => tracing::info!(
                    saved = report.scraper_result.total_jobs_saved,
                    archived = report.archived_jobs,
                    "Scheduled scrape complete"
                ),
                Err(e) => tracing::error!("Scheduled scrape failed: {}", e),
            }
        })
    })?;

    cron.add(job).await?;
    cron.start().await?;

    tracing::info!(schedule, "Scheduled scraping started");
    Ok(cron)
}
