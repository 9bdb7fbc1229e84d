//! In-memory job store for testing and development.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{JobReader, JobWriter, SourceLock, SourceLocker};
use crate::types::{
    ExistingJob, JobCandidate, JobFilter, JobId, JobPosting, JobSource, NewJob, Page,
    ScraperStats, SourceCount,
};

/// Number of recent postings reported by `stats`.
pub const RECENT_JOBS: usize = 10;

/// In-memory storage for job postings.
///
/// Enforces the same (url, source) uniqueness as the Postgres schema and
/// counts calls so tests can assert which operations ran. Data is lost on
/// drop.
pub struct MemoryStore {
    jobs: RwLock<Vec<JobPosting>>,
    locks: Arc<Mutex<HashSet<JobSource>>>,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
    failing_creates: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
            locks: Arc::new(Mutex::new(HashSet::new())),
            find_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            failing_creates: AtomicUsize::new(0),
        }
    }

    /// Insert an active posting directly, bypassing call counters.
    ///
    /// Panics if the candidate does not validate.
    pub fn seed(&self, candidate: JobCandidate) -> JobPosting {
        self.seed_at(candidate, Utc::now())
    }

    /// Like [`seed`](Self::seed) with an explicit `scraped_at`.
    pub fn seed_at(&self, candidate: JobCandidate, scraped_at: DateTime<Utc>) -> JobPosting {
        let job = candidate
            .validate()
            .expect("seeded candidates must be valid");
        let posting = JobPosting::from_new(job, scraped_at);
        self.jobs.write().unwrap().push(posting.clone());
        posting
    }

    /// Make the next `n` calls to `create` fail with a transient error.
    pub fn fail_next_creates(&self, n: usize) {
        self.failing_creates.store(n, Ordering::SeqCst);
    }

    /// Calls to `find_active_by_source` so far.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Calls to `create` so far, failed attempts included.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Every stored posting, active or not.
    pub fn all(&self) -> Vec<JobPosting> {
        self.jobs.read().unwrap().clone()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_locked(&self, source: JobSource) -> bool {
        self.locks.lock().unwrap().contains(&source)
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl JobWriter for MemoryStore {
    async fn find_active_by_source(&self, source: JobSource) -> StoreResult<Vec<ExistingJob>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .jobs
            .read()
            .unwrap()
            .iter()
            .filter(|job| job.is_active && job.source == source)
            .map(ExistingJob::from)
            .collect())
    }

    async fn create(&self, job: &NewJob) -> StoreResult<JobPosting> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_injected_failure() {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut jobs = self.jobs.write().unwrap();
        if jobs
            .iter()
            .any(|existing| {
                existing.is_active && existing.url == job.url && existing.source == job.source
            })
        {
            return Err(StoreError::DuplicateKey {
                url: job.url.clone(),
            });
        }

        let posting = JobPosting::from_new(job.clone(), Utc::now());
        jobs.push(posting.clone());
        Ok(posting)
    }

    async fn archive_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let now = Utc::now();
        let mut archived = 0;
        for job in self.jobs.write().unwrap().iter_mut() {
            if job.is_active && job.scraped_at < cutoff {
                job.is_active = false;
                job.updated_at = now;
                archived += 1;
            }
        }
        Ok(archived)
    }
}

#[async_trait]
impl JobReader for MemoryStore {
    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<JobPosting>> {
        Ok(self
            .jobs
            .read()
            .unwrap()
            .iter()
            .find(|job| job.id == id)
            .cloned())
    }

    async fn list_active(&self, filter: &JobFilter) -> StoreResult<Page<JobPosting>> {
        let mut matching: Vec<JobPosting> = self
            .jobs
            .read()
            .unwrap()
            .iter()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page: filter.page(),
            limit: filter.limit(),
        })
    }

    async fn stats(&self) -> StoreResult<ScraperStats> {
        let jobs = self.jobs.read().unwrap();

        let mut active: Vec<&JobPosting> = jobs.iter().filter(|job| job.is_active).collect();
        let jobs_by_source = JobSource::ALL
            .into_iter()
            .map(|source| SourceCount {
                source,
                count: active.iter().filter(|job| job.source == source).count() as u64,
            })
            .filter(|entry| entry.count > 0)
            .collect();

        active.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        Ok(ScraperStats {
            total_jobs: jobs.len() as u64,
            active_jobs: active.len() as u64,
            jobs_by_source,
            recent_jobs: active.into_iter().take(RECENT_JOBS).cloned().collect(),
        })
    }
}

/// Removes its source from the lock set on drop.
struct MemoryLockGuard {
    locks: Arc<Mutex<HashSet<JobSource>>>,
    source: JobSource,
}

impl Drop for MemoryLockGuard {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&self.source);
        }
    }
}

#[async_trait]
impl SourceLocker for MemoryStore {
    async fn lock_source(&self, source: JobSource) -> StoreResult<Option<SourceLock>> {
        if !self.locks.lock().unwrap().insert(source) {
            return Ok(None);
        }
        Ok(Some(SourceLock::new(
            source,
            MemoryLockGuard {
                locks: Arc::clone(&self.locks),
                source,
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CandidateBuilder;
    use chrono::Duration;

    #[tokio::test]
    async fn create_rejects_same_url_and_source() {
        let store = MemoryStore::new();
        let job = CandidateBuilder::new("Peer Specialist", "Acme")
            .build()
            .validate()
            .unwrap();

        store.create(&job).await.unwrap();
        let err = store.create(&job).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        let mut other_source = job.clone().into_inner();
        other_source.source = JobSource::LinkedIn;
        store.create(&other_source.validate().unwrap()).await.unwrap();
        assert_eq!(store.job_count(), 2);
    }

    #[tokio::test]
    async fn archive_is_idempotent() {
        let store = MemoryStore::new();
        let old = Utc::now() - Duration::days(120);
        store.seed_at(CandidateBuilder::new("Peer Advocate", "Acme").url("https://x.org/1").build(), old);
        store.seed_at(CandidateBuilder::new("Recovery Coach", "Acme").url("https://x.org/2").build(), old);
        store.seed(CandidateBuilder::new("Peer Counselor", "Acme").url("https://x.org/3").build());

        let cutoff = Utc::now() - Duration::days(90);
        assert_eq!(store.archive_older_than(cutoff).await.unwrap(), 2);
        assert_eq!(store.archive_older_than(cutoff).await.unwrap(), 0);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_jobs, 3);
        assert_eq!(stats.active_jobs, 1);
    }

    #[tokio::test]
    async fn archived_postings_drop_out_of_dedup_set() {
        let store = MemoryStore::new();
        store.seed_at(
            CandidateBuilder::new("Peer Advocate", "Acme").build(),
            Utc::now() - Duration::days(100),
        );
        assert_eq!(store.find_active_by_source(JobSource::Indeed).await.unwrap().len(), 1);

        store
            .archive_older_than(Utc::now() - Duration::days(90))
            .await
            .unwrap();
        assert!(store.find_active_by_source(JobSource::Indeed).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn archived_url_can_be_listed_again() {
        let url = "https://www.indeed.com/viewjob?jk=relisted";
        let store = MemoryStore::new();
        store.seed_at(
            CandidateBuilder::new("Peer Specialist", "Acme").url(url).build(),
            Utc::now() - Duration::days(120),
        );
        assert_eq!(
            store
                .archive_older_than(Utc::now() - Duration::days(90))
                .await
                .unwrap(),
            1
        );

        let relisted = CandidateBuilder::new("Peer Specialist", "Acme")
            .url(url)
            .build()
            .validate()
            .unwrap();
        let created = store.create(&relisted).await.unwrap();
        assert!(created.is_active);

        let err = store.create(&relisted).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.active_jobs, 1);
    }

    #[tokio::test]
    async fn list_active_filters_and_pages_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store.seed_at(
                CandidateBuilder::new(format!("Peer Specialist {}", i), "Acme")
                    .url(format!("https://x.org/{}", i))
                    .location("Queens, NY")
                    .build(),
                now - Duration::hours(i),
            );
        }
        store.seed(
            CandidateBuilder::new("Recovery Coach", "Bronx Works")
                .url("https://x.org/bronx")
                .location("Bronx, NY")
                .source(JobSource::LinkedIn)
                .build(),
        );

        let page = store
            .list_active(&JobFilter::new().with_search("specialist").with_page(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Peer Specialist 0");
        assert_eq!(page.total_pages(), 3);

        let linkedin = store
            .list_active(&JobFilter::new().with_source(JobSource::LinkedIn))
            .await
            .unwrap();
        assert_eq!(linkedin.total, 1);
        assert_eq!(linkedin.items[0].company, "Bronx Works");
    }

    #[tokio::test]
    async fn stats_group_by_source() {
        let store = MemoryStore::new();
        store.seed(CandidateBuilder::new("Peer Advocate", "A").url("https://x.org/a").build());
        store.seed(
            CandidateBuilder::new("Peer Advocate", "B")
                .url("https://x.org/b")
                .source(JobSource::LinkedIn)
                .build(),
        );
        store.seed(CandidateBuilder::new("Peer Advocate", "C").url("https://x.org/c").build());

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats.jobs_by_source,
            vec![
                SourceCount {
                    source: JobSource::Indeed,
                    count: 2
                },
                SourceCount {
                    source: JobSource::LinkedIn,
                    count: 1
                },
            ]
        );
        assert_eq!(stats.recent_jobs.len(), 3);
    }

    #[tokio::test]
    async fn source_lock_is_exclusive_until_dropped() {
        let store = MemoryStore::new();
        let lock = store.lock_source(JobSource::Indeed).await.unwrap().unwrap();
        assert!(store.lock_source(JobSource::Indeed).await.unwrap().is_none());
        assert!(store.lock_source(JobSource::LinkedIn).await.unwrap().is_some());

        drop(lock);
        assert!(!store.is_locked(JobSource::Indeed));
        assert!(store.lock_source(JobSource::Indeed).await.unwrap().is_some());
    }
}
