//! Persistence traits for job postings.
//!
//! The storage layer is split into focused traits:
//! - `JobWriter`: what a scrape run needs (dedup set, insert, archival)
//! - `JobReader`: listing and stats for the job board
//! - `SourceLocker`: one scrape per source at a time
//! - `JobStore`: composite trait combining all three

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::types::{ExistingJob, JobFilter, JobId, JobPosting, JobSource, NewJob, Page, ScraperStats};

/// Write side used by the scrape pipeline.
#[async_trait]
pub trait JobWriter: Send + Sync {
    /// Title, company, and url of every active posting for `source`.
    async fn find_active_by_source(&self, source: JobSource) -> StoreResult<Vec<ExistingJob>>;

    /// Insert a validated job as a new active posting.
    ///
    /// Fails with `StoreError::DuplicateKey` if a posting with the same
    /// (url, source) already exists.
    async fn create(&self, job: &NewJob) -> StoreResult<JobPosting>;

    /// Flip `is_active` to false on active postings scraped before `cutoff`.
    ///
    /// Returns the number of postings changed.
    async fn archive_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

/// Read side used by the job board and operators.
#[async_trait]
pub trait JobReader: Send + Sync {
    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<JobPosting>>;

    /// Active postings matching `filter`, newest first.
    async fn list_active(&self, filter: &JobFilter) -> StoreResult<Page<JobPosting>>;

    async fn stats(&self) -> StoreResult<ScraperStats>;
}

/// Held while a scrape of one source is running. Dropping it releases the lock.
pub struct SourceLock {
    source: JobSource,
    _guard: Box<dyn Send>,
}

impl SourceLock {
    pub fn new(source: JobSource, guard: impl Send + 'static) -> Self {
        Self {
            source,
            _guard: Box::new(guard),
        }
    }

    pub fn source(&self) -> JobSource {
        self.source
    }
}

impl std::fmt::Debug for SourceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLock").field("source", &self.source).finish()
    }
}

/// Mutual exclusion between scrapes of the same source.
#[async_trait]
pub trait SourceLocker: Send + Sync {
    /// Try to take the lock for `source` without waiting.
    ///
    /// Returns `None` if another run holds it.
    async fn lock_source(&self, source: JobSource) -> StoreResult<Option<SourceLock>>;
}

/// Composite storage trait.
///
/// This is the trait the engine and scheduler hold.
pub trait JobStore: JobWriter + JobReader + SourceLocker {}

// Blanket implementation: anything implementing all three traits is a JobStore
impl<T: JobWriter + JobReader + SourceLocker> JobStore for T {}
