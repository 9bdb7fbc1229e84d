//! Peer-Support Job Scraper
//!
//! Scrapes peer-support job listings from public job boards with a headless
//! browser, normalizes them, filters out unrelated postings, and stores what
//! is new. A scheduler runs every configured source in turn and archives
//! stale postings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use job_scraper::{ChromiumLauncher, Engine, PostgresStore, Scheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = PostgresStore::connect(&database_url).await?;
//! store.migrate().await?;
//!
//! let engine = Engine::new(Arc::new(ChromiumLauncher::new()), Arc::new(store));
//! let scheduler = Scheduler::with_default_sources(engine);
//!
//! let summary = scheduler.run_all_scrapers(&CancellationToken::new()).await;
//! let archived = scheduler.archive_old_jobs(90).await?;
//! ```
//!
//! # Modules
//!
//! - [`normalize`] - Text cleanup, salary/date parsing, duplicate detection
//! - [`classify`] - Job type and specialty inference
//! - [`sources`] - Per-board search configuration
//! - [`engine`] - One scrape run of one source
//! - [`extractors`] - Site-specific result page parsing
//! - [`scheduler`] - Runs every source and archives old postings
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`browser`] - Chromium backend
//! - [`testing`] - Mock implementations for testing

pub mod browser;
pub mod classify;
pub mod config;
pub mod cron;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod normalize;
pub mod scheduler;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use browser::ChromiumLauncher;
pub use config::Config;
pub use engine::{save_jobs, Engine, EngineOptions, RetryPolicy, ScrapeContext};
pub use error::{BrowserError, ParseError, ScrapeError, StoreError, ValidationError};
pub use extractors::{IndeedScraper, LinkedInScraper};
pub use scheduler::Scheduler;
pub use sources::{Selectors, SourceConfig};
pub use stores::{MemoryStore, PostgresStore};
pub use traits::{
    browser::{BrowserLauncher, BrowserPage, BrowserSession, LaunchOptions},
    extractor::SearchScraper,
    store::{JobReader, JobStore, JobWriter, SourceLock, SourceLocker},
};
pub use types::{
    Certification, JobCandidate, JobFilter, JobPosting, JobSource, JobType, NewJob, Page,
    SchedulerResult, ScrapeResult, ScraperStats, Specialty,
};
