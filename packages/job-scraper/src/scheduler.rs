//! Runs every registered source in turn and archives stale postings.
//!
//! Sources are scraped one at a time. A source whose scrape panics is turned
//! into a zero-count result carrying the panic message, so one broken
//! extractor never stops the others.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::engine::Engine;
use crate::error::{Result, ScrapeError, StoreResult};
use crate::extractors::{IndeedScraper, LinkedInScraper};
use crate::sources::SourceConfig;
use crate::traits::extractor::SearchScraper;
use crate::traits::store::{JobReader, JobWriter};
use crate::types::{JobSource, SchedulerResult, ScrapeResult, ScraperStats};

/// Postings older than this many days are archived by default.
pub const DEFAULT_ARCHIVE_DAYS: u32 = 90;

struct Registration {
    config: SourceConfig,
    extractor: Arc<dyn SearchScraper>,
}

pub struct Scheduler {
    engine: Engine,
    registrations: Vec<Registration>,
}

impl Scheduler {
    /// A scheduler with no sources registered.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            registrations: Vec::new(),
        }
    }

    /// Every source that has both a configuration and an extractor.
    pub fn with_default_sources(engine: Engine) -> Self {
        let extractors: [Arc<dyn SearchScraper>; 2] =
            [Arc::new(IndeedScraper::new()), Arc::new(LinkedInScraper::new())];

        extractors
            .into_iter()
            .fold(Self::new(engine), |scheduler, extractor| {
                match extractor.source().config() {
                    Some(config) => scheduler.register(config, extractor),
                    None => scheduler,
                }
            })
    }

    /// Add a source. Sources run in registration order.
    pub fn register(mut self, config: SourceConfig, extractor: Arc<dyn SearchScraper>) -> Self {
        if extractor.source() != config.source {
            warn!(
                config = %config.source,
                extractor = %extractor.source(),
                "Extractor registered for a different source"
            );
        }
        self.registrations.push(Registration { config, extractor });
        self
    }

    pub fn sources(&self) -> Vec<JobSource> {
        self.registrations.iter().map(|r| r.config.source).collect()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Scrape every registered source in sequence.
    #[instrument(skip_all)]
    pub async fn run_all_scrapers(&self, cancel: &CancellationToken) -> SchedulerResult {
        let started = Instant::now();
        info!(sources = self.registrations.len(), "Starting scraper run");

        let mut results = Vec::with_capacity(self.registrations.len());
        for registration in &self.registrations {
            let source = registration.config.source;
            if cancel.is_cancelled() {
                warn!(%source, "Run cancelled before source started");
                results.push(ScrapeResult::failed(
                    source,
                    ScrapeError::Cancelled.to_string(),
                    std::time::Duration::ZERO,
                ));
                continue;
            }

            info!(%source, "Running scraper");
            results.push(self.run_isolated(registration, cancel).await);
        }

        let summary = SchedulerResult::from_results(results, started.elapsed());
        info!(
            scraped = summary.total_jobs_scraped,
            saved = summary.total_jobs_saved,
            duplicates = summary.total_duplicates,
            errors = summary.total_errors,
            duration_ms = summary.duration_ms,
            "Scraper run completed"
        );
        summary
    }

    /// Scrape a single source on demand.
    pub async fn scrape(&self, source: JobSource, cancel: &CancellationToken) -> Result<ScrapeResult> {
        let registration = self
            .registrations
            .iter()
            .find(|r| r.config.source == source)
            .ok_or(ScrapeError::NotConfigured(source))?;
        Ok(self.run_isolated(registration, cancel).await)
    }

    async fn run_isolated(&self, registration: &Registration, cancel: &CancellationToken) -> ScrapeResult {
        let started = Instant::now();
        let source = registration.config.source;
        let run = self
            .engine
            .scrape(registration.extractor.as_ref(), &registration.config, cancel);

        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = format!("{} scraper panicked: {}", source, panic_message(panic.as_ref()));
                error!("{}", message);
                ScrapeResult::failed(source, message, started.elapsed())
            }
        }
    }

    /// Deactivate active postings scraped more than `days_old` days ago.
    ///
    /// Re-running with the same cutoff changes nothing further.
    pub async fn archive_old_jobs(&self, days_old: u32) -> StoreResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days_old));
        let archived = self.engine.store().archive_older_than(cutoff).await?;
        info!(days_old, archived, "Archived old jobs");
        Ok(archived)
    }

    pub async fn stats(&self) -> StoreResult<ScraperStats> {
        self.engine.store().stats().await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
