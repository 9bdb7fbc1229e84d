//! Scrape engine: one run of one source.
//!
//! [`Engine::scrape`] owns the browser for the whole run and walks every
//! keyword x location combination in order, handing each to the site
//! extractor and persisting what comes back with [`save_jobs`]. Per-combination
//! failures are recorded and skipped; failing to start the browser (or to get
//! the source lock) ends the run with a single fatal error. Browser resources
//! are released on every path.

pub mod dom;
pub mod retry;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{BrowserError, BrowserResult, ScrapeError, StoreError, StoreResult};
use crate::normalize::{is_duplicate, is_peer_support_job, DedupKey};
use crate::sources::SourceConfig;
use crate::traits::browser::{BrowserLauncher, BrowserPage, BrowserSession, LaunchOptions};
use crate::traits::extractor::SearchScraper;
use crate::traits::store::{JobStore, JobWriter};
use crate::types::{JobCandidate, JobSource, SaveOutcome, ScrapeResult};

pub use retry::{retry, retry_if, RetryPolicy};

/// Timeouts and retry policies for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub launch: LaunchOptions,
    /// Search-page navigation
    pub navigation_timeout: Duration,
    /// Wait for the first result card
    pub selector_timeout: Duration,
    /// Detail-page navigation
    pub detail_timeout: Duration,
    /// Wait for the description element on a detail page
    pub description_timeout: Duration,
    pub navigation_retry: RetryPolicy,
    pub save_retry: RetryPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            launch: LaunchOptions::default(),
            navigation_timeout: Duration::from_secs(30),
            selector_timeout: Duration::from_secs(10),
            detail_timeout: Duration::from_secs(15),
            description_timeout: Duration::from_secs(5),
            navigation_retry: RetryPolicy::default(),
            save_retry: RetryPolicy::default(),
        }
    }
}

impl EngineOptions {
    /// No retries or backoff. For tests driving mock browsers.
    pub fn without_retries(mut self) -> Self {
        self.navigation_retry = RetryPolicy::none();
        self.save_retry = RetryPolicy::none();
        self
    }
}

/// What an extractor can do during a run: drive the main tab, open detail
/// tabs, and pace itself.
pub struct ScrapeContext<'a> {
    session: &'a dyn BrowserSession,
    page: &'a dyn BrowserPage,
    config: &'a SourceConfig,
    options: &'a EngineOptions,
    cancel: &'a CancellationToken,
}

impl<'a> ScrapeContext<'a> {
    pub fn new(
        session: &'a dyn BrowserSession,
        page: &'a dyn BrowserPage,
        config: &'a SourceConfig,
        options: &'a EngineOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            session,
            page,
            config,
            options,
            cancel,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        self.config
    }

    pub fn options(&self) -> &EngineOptions {
        self.options
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Navigate the main tab, retrying transient failures with backoff.
    pub async fn navigate_with_retry(&self, url: &str) -> BrowserResult<()> {
        let page = self.page;
        let timeout = self.options.navigation_timeout;
        retry(self.options.navigation_retry, move || page.goto(url, timeout)).await
    }

    /// Wait for `selector` on the main tab. A timeout means "not there" and
    /// yields `false`.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        match self.page.wait_for_selector(selector, timeout).await {
            Ok(()) => true,
            Err(BrowserError::Timeout { .. }) => {
                debug!(selector, "Selector did not appear");
                false
            }
            Err(e) => {
                warn!(selector, error = %e, "Selector wait failed");
                false
            }
        }
    }

    /// HTML of the main tab.
    pub async fn page_content(&self) -> BrowserResult<String> {
        self.page.content().await
    }

    /// Full description text from a detail page, opened in its own tab.
    ///
    /// Any failure (navigation, missing element, blank text) yields `None`.
    /// The tab is closed either way.
    pub async fn fetch_description(&self, url: &str) -> Option<String> {
        let detail = match self.session.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, error = %e, "Could not open detail page");
                return None;
            }
        };

        let description = self.read_description(detail.as_ref(), url).await;
        if let Err(e) = detail.close().await {
            debug!(url, error = %e, "Failed to close detail page");
        }

        match description {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                debug!(url, "Detail page has no description text");
                None
            }
            Err(e) => {
                warn!("Error getting job description from {}: {}", url, e);
                None
            }
        }
    }

    async fn read_description(&self, detail: &dyn BrowserPage, url: &str) -> BrowserResult<Option<String>> {
        let selector = &self.config.selectors.description;
        detail.goto(url, self.options.detail_timeout).await?;
        detail
            .wait_for_selector(selector, self.options.description_timeout)
            .await?;
        let html = detail.content().await?;
        Ok(dom::read_description(&html, selector))
    }

    /// Sleep for the source's rate limit. Returns early on cancellation.
    pub async fn pace(&self) {
        let delay = self.config.rate_limit;
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

/// Drives scrape runs against a browser launcher and a job store.
pub struct Engine {
    launcher: Arc<dyn BrowserLauncher>,
    store: Arc<dyn JobStore>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, store: Arc<dyn JobStore>) -> Self {
        Self {
            launcher,
            store,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run one full scrape of `config.source` with `extractor`.
    ///
    /// Never fails: every problem ends up in `ScrapeResult::errors`.
    #[instrument(skip_all, fields(source = %config.source))]
    pub async fn scrape(
        &self,
        extractor: &dyn SearchScraper,
        config: &SourceConfig,
        cancel: &CancellationToken,
    ) -> ScrapeResult {
        let started = Instant::now();
        let source = config.source;
        info!(
            combinations = config.combinations(),
            max_pages = config.max_pages,
            "Starting scrape"
        );

        let _lock = match self.store.lock_source(source).await {
            Ok(Some(lock)) => lock,
            Ok(None) => return fatal(source, ScrapeError::SourceBusy(source), started),
            Err(e) => return fatal(source, ScrapeError::Store(e), started),
        };

        let session = match self.launcher.launch(&self.options.launch).await {
            Ok(session) => session,
            Err(e) => return fatal(source, ScrapeError::Browser(e), started),
        };

        let mut result = ScrapeResult::new(source);
        match session.new_page().await {
            Ok(page) => {
                {
                    let ctx = ScrapeContext::new(
                        session.as_ref(),
                        page.as_ref(),
                        config,
                        &self.options,
                        cancel,
                    );
                    self.run_combinations(extractor, &ctx, &mut result).await;
                }
                if let Err(e) = page.close().await {
                    warn!(error = %e, "Failed to close page");
                }
            }
            Err(e) => {
                let message = fatal_message(&ScrapeError::Browser(e));
                error!("{}", message);
                result.errors.push(message);
            }
        }

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser");
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            scraped = result.jobs_scraped,
            saved = result.jobs_saved,
            duplicates = result.duplicates_skipped,
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "Scrape finished"
        );
        result
    }

    async fn run_combinations(
        &self,
        extractor: &dyn SearchScraper,
        ctx: &ScrapeContext<'_>,
        result: &mut ScrapeResult,
    ) {
        let config = ctx.config();
        'keywords: for keyword in &config.search_keywords {
            for location in &config.search_locations {
                if ctx.is_cancelled() {
                    warn!("Scrape cancelled, skipping remaining combinations");
                    result.errors.push(ScrapeError::Cancelled.to_string());
                    break 'keywords;
                }

                if let Err(e) = self.scrape_combination(extractor, ctx, keyword, location, result).await {
                    let message = format!("Error scraping {} in {}: {}", keyword, location, e);
                    error!("{}", message);
                    result.errors.push(message);
                }

                ctx.pace().await;
            }
        }
    }

    async fn scrape_combination(
        &self,
        extractor: &dyn SearchScraper,
        ctx: &ScrapeContext<'_>,
        keyword: &str,
        location: &str,
        result: &mut ScrapeResult,
    ) -> crate::error::Result<()> {
        info!(keyword, location, "Scraping combination");
        let candidates = extractor.scrape_search(ctx, keyword, location).await?;
        result.jobs_scraped += candidates.len();

        let outcome = save_jobs(
            self.store.as_ref(),
            ctx.config().source,
            &candidates,
            self.options.save_retry,
        )
        .await?;
        debug!(
            keyword,
            location,
            found = candidates.len(),
            saved = outcome.saved,
            duplicates = outcome.duplicates,
            "Combination done"
        );
        result.absorb(outcome);
        Ok(())
    }
}

fn fatal_message(e: &ScrapeError) -> String {
    format!("Fatal scraping error: {}", e)
}

fn fatal(source: JobSource, e: ScrapeError, started: Instant) -> ScrapeResult {
    let message = fatal_message(&e);
    error!("{}", message);
    ScrapeResult::failed(source, message, started.elapsed())
}

/// Persist one batch of candidates for `source`.
///
/// The dedup set is the active postings for `source`, fetched once up front.
/// It is not refreshed as candidates are saved, so two near-identical
/// candidates in the same batch are both inserted unless the store rejects
/// the second as a duplicate key.
///
/// Candidates that are not peer-support jobs are dropped without counting.
/// Validation and insert failures are recorded in `errors`; only failing to
/// load the dedup set is returned as `Err`.
pub async fn save_jobs<S>(
    store: &S,
    source: JobSource,
    candidates: &[JobCandidate],
    retry_policy: RetryPolicy,
) -> StoreResult<SaveOutcome>
where
    S: JobWriter + ?Sized,
{
    let existing = store.find_active_by_source(source).await?;
    let mut outcome = SaveOutcome::default();

    for candidate in candidates {
        if !is_peer_support_job(&candidate.title, &candidate.description) {
            debug!(title = %candidate.title, "Not a peer-support job, skipping");
            continue;
        }

        let key = DedupKey::from(candidate);
        if existing.iter().any(|job| is_duplicate(key, DedupKey::from(job))) {
            debug!(url = %candidate.url, "Duplicate of an active posting");
            outcome.duplicates += 1;
            continue;
        }

        let job = match candidate.clone().validate() {
            Ok(job) => job,
            Err(e) => {
                outcome.errors.push(save_error(&candidate.title, e));
                continue;
            }
        };

        let job = &job;
        let created = retry_if(
            retry_policy,
            move || store.create(job),
            |e| !matches!(e, StoreError::DuplicateKey { .. }),
        )
        .await;

        match created {
            Ok(posting) => {
                debug!(id = %posting.id, url = %posting.url, "Saved job");
                outcome.saved += 1;
            }
            Err(e) => outcome.errors.push(save_error(&candidate.title, e)),
        }
    }

    Ok(outcome)
}

fn save_error(title: &str, e: impl std::fmt::Display) -> String {
    let message = format!("Error saving job \"{}\": {}", title, e);
    warn!("{}", message);
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::CandidateBuilder;
    use crate::traits::store::JobReader;
    use crate::types::JobFilter;

    #[tokio::test]
    async fn save_jobs_skips_non_peer_support_without_touching_store_writes() {
        let store = MemoryStore::new();
        let candidates = vec![
            CandidateBuilder::new("Software Engineer", "Acme")
                .description("Write Rust services")
                .build(),
            CandidateBuilder::new("Barista", "Cafe")
                .description("Make coffee")
                .build(),
        ];

        let outcome = save_jobs(&store, JobSource::Indeed, &candidates, RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::default());
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn save_jobs_counts_duplicates_against_active_postings() {
        let store = MemoryStore::new();
        store.seed(
            CandidateBuilder::new("Peer Advocate", "Acme")
                .url("https://www.indeed.com/viewjob?jk=1")
                .build(),
        );

        let candidates = vec![
            // same url
            CandidateBuilder::new("Recovery Coach", "Someone Else")
                .url("https://www.indeed.com/viewjob?jk=1")
                .build(),
            // same company, near-identical title
            CandidateBuilder::new("Peer Advocate II", "ACME")
                .url("https://www.indeed.com/viewjob?jk=2")
                .build(),
            CandidateBuilder::new("Peer Advocate", "Other Inc")
                .url("https://www.indeed.com/viewjob?jk=3")
                .build(),
        ];

        let outcome = save_jobs(&store, JobSource::Indeed, &candidates, RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(outcome.duplicates, 2);
        assert_eq!(outcome.saved, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.find_calls(), 1);
    }

    #[tokio::test]
    async fn save_jobs_records_validation_errors_by_title() {
        let store = MemoryStore::new();
        let candidates = vec![CandidateBuilder::new("Peer Specialist", "Acme")
            .url("/relative/link")
            .build()];

        let outcome = save_jobs(&store, JobSource::Indeed, &candidates, RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(outcome.saved, 0);
        assert_eq!(outcome.duplicates, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Error saving job \"Peer Specialist\": invalid url"));
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn save_jobs_retries_transient_insert_failures() {
        let store = MemoryStore::new();
        store.fail_next_creates(2);
        let candidates = vec![CandidateBuilder::new("Peer Specialist", "Acme").build()];

        let outcome = save_jobs(&store, JobSource::Indeed, &candidates, RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.saved, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.create_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn save_jobs_reports_exhausted_retries() {
        let store = MemoryStore::new();
        store.fail_next_creates(5);
        let candidates = vec![CandidateBuilder::new("Peer Specialist", "Acme").build()];

        let outcome = save_jobs(&store, JobSource::Indeed, &candidates, RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.saved, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(store.create_calls(), 3);
    }

    #[tokio::test]
    async fn same_batch_duplicates_are_not_collapsed() {
        let store = MemoryStore::new();
        let candidates = vec![
            CandidateBuilder::new("Peer Specialist", "Acme")
                .url("https://www.indeed.com/viewjob?jk=9")
                .build(),
            CandidateBuilder::new("Peer Specialist", "Acme")
                .url("https://www.indeed.com/viewjob?jk=10")
                .build(),
        ];

        let outcome = save_jobs(&store, JobSource::Indeed, &candidates, RetryPolicy::none())
            .await
            .unwrap();

        // the dedup set is only loaded once per batch
        assert_eq!(outcome.saved, 2);
        assert_eq!(outcome.duplicates, 0);
        let listed = store.list_active(&JobFilter::new()).await.unwrap();
        assert_eq!(listed.total, 2);
    }
}
