//! Per-run summaries. Built fresh for each run and never persisted.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::JobSource;

/// Summary of one scrape run against a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub source: JobSource,
    pub jobs_scraped: usize,
    pub jobs_saved: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl ScrapeResult {
    pub fn new(source: JobSource) -> Self {
        Self {
            source,
            jobs_scraped: 0,
            jobs_saved: 0,
            duplicates_skipped: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// A zero-count result carrying a single error.
    pub fn failed(source: JobSource, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            errors: vec![error.into()],
            duration_ms: duration.as_millis() as u64,
            ..Self::new(source)
        }
    }

    /// Fold a persistence pass into the running totals.
    pub fn absorb(&mut self, outcome: SaveOutcome) {
        self.jobs_saved += outcome.saved;
        self.duplicates_skipped += outcome.duplicates;
        self.errors.extend(outcome.errors);
    }
}

/// What one `save_jobs` pass did with its candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

/// Aggregate of one scheduler invocation across every registered source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerResult {
    pub timestamp: DateTime<Utc>,
    pub results: Vec<ScrapeResult>,
    pub total_jobs_scraped: usize,
    pub total_jobs_saved: usize,
    pub total_duplicates: usize,
    pub total_errors: usize,
    pub duration_ms: u64,
}

impl SchedulerResult {
    pub fn from_results(results: Vec<ScrapeResult>, duration: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            total_jobs_scraped: results.iter().map(|r| r.jobs_scraped).sum(),
            total_jobs_saved: results.iter().map(|r| r.jobs_saved).sum(),
            total_duplicates: results.iter().map(|r| r.duplicates_skipped).sum(),
            total_errors: results.iter().map(|r| r.errors.len()).sum(),
            duration_ms: duration.as_millis() as u64,
            results,
        }
    }
}
