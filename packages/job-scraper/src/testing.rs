//! Testing utilities including mock implementations.
//!
//! These let the engine, extractors, and scheduler run without a real
//! browser: `MockLauncher` serves canned HTML by URL and records every call,
//! `MockExtractor` returns canned candidates per combination.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::dom::{self, ResultCard};
use crate::engine::ScrapeContext;
use crate::error::{BrowserError, BrowserResult, Result};
use crate::traits::browser::{BrowserLauncher, BrowserPage, BrowserSession, LaunchOptions};
use crate::traits::extractor::SearchScraper;
use crate::types::{Certification, JobCandidate, JobSource, JobType, Specialty};

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";

/// Record of a call made to the mock browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBrowserCall {
    Launch,
    NewPage,
    Goto { url: String },
    WaitForSelector { selector: String },
    Content,
    ClosePage,
    CloseSession,
}

#[derive(Default)]
struct MockWeb {
    /// HTML served per URL; unknown URLs load a blank document
    pages: HashMap<String, String>,
    /// Remaining failing navigations per URL
    failures: HashMap<String, usize>,
    calls: Vec<MockBrowserCall>,
    open_pages: usize,
    open_sessions: usize,
}

/// A mock browser launcher serving fixture HTML.
#[derive(Clone, Default)]
pub struct MockLauncher {
    web: Arc<RwLock<MockWeb>>,
    launch_error: Option<String>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher whose every launch fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            launch_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Serve `html` when `url` is loaded.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.web
            .write()
            .unwrap()
            .pages
            .insert(url.into(), html.into());
        self
    }

    /// Fail the next `times` navigations to `url`.
    pub fn with_navigation_failures(self, url: impl Into<String>, times: usize) -> Self {
        self.web
            .write()
            .unwrap()
            .failures
            .insert(url.into(), times);
        self
    }

    pub fn calls(&self) -> Vec<MockBrowserCall> {
        self.web.read().unwrap().calls.clone()
    }

    pub fn launches(&self) -> usize {
        self.count(|call| matches!(call, MockBrowserCall::Launch))
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockBrowserCall::Goto { url } => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Pages opened and not yet closed.
    pub fn open_pages(&self) -> usize {
        self.web.read().unwrap().open_pages
    }

    /// Sessions launched and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.web.read().unwrap().open_sessions
    }

    fn count(&self, predicate: impl Fn(&MockBrowserCall) -> bool) -> usize {
        self.web
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

fn record(web: &RwLock<MockWeb>, call: MockBrowserCall) {
    web.write().unwrap().calls.push(call);
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> BrowserResult<Box<dyn BrowserSession>> {
        record(&self.web, MockBrowserCall::Launch);
        if let Some(message) = &self.launch_error {
            return Err(BrowserError::Launch(message.clone()));
        }
        self.web.write().unwrap().open_sessions += 1;
        Ok(Box::new(MockSession {
            web: Arc::clone(&self.web),
        }))
    }
}

pub struct MockSession {
    web: Arc<RwLock<MockWeb>>,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn new_page(&self) -> BrowserResult<Box<dyn BrowserPage>> {
        record(&self.web, MockBrowserCall::NewPage);
        self.web.write().unwrap().open_pages += 1;
        Ok(Box::new(MockPage {
            web: Arc::clone(&self.web),
            html: Mutex::new(None),
        }))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        record(&self.web, MockBrowserCall::CloseSession);
        self.web.write().unwrap().open_sessions -= 1;
        Ok(())
    }
}

pub struct MockPage {
    web: Arc<RwLock<MockWeb>>,
    html: Mutex<Option<String>>,
}

impl MockPage {
    fn current_html(&self) -> String {
        self.html
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| BLANK_PAGE.to_string())
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn goto(&self, url: &str, _timeout: Duration) -> BrowserResult<()> {
        let mut web = self.web.write().unwrap();
        web.calls.push(MockBrowserCall::Goto {
            url: url.to_string(),
        });

        if let Some(remaining) = web.failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_CONNECTION_RESET".to_string(),
                });
            }
        }

        let html = web
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| BLANK_PAGE.to_string());
        *self.html.lock().unwrap() = Some(html);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        record(
            &self.web,
            MockBrowserCall::WaitForSelector {
                selector: selector.to_string(),
            },
        );
        if dom::has_match(&self.current_html(), selector) {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                what: format!("selector {}", selector),
                after: timeout,
            })
        }
    }

    async fn content(&self) -> BrowserResult<String> {
        record(&self.web, MockBrowserCall::Content);
        Ok(self.current_html())
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        record(&self.web, MockBrowserCall::ClosePage);
        self.web.write().unwrap().open_pages -= 1;
        Ok(())
    }
}

/// A mock extractor returning canned results per (keyword, location).
///
/// Combinations without a canned result yield no candidates.
pub struct MockExtractor {
    source: JobSource,
    results: RwLock<HashMap<(String, String), std::result::Result<Vec<JobCandidate>, String>>>,
    calls: RwLock<Vec<(String, String)>>,
}

impl MockExtractor {
    pub fn new(source: JobSource) -> Self {
        Self {
            source,
            results: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    pub fn with_candidates(
        self,
        keyword: impl Into<String>,
        location: impl Into<String>,
        candidates: Vec<JobCandidate>,
    ) -> Self {
        self.results
            .write()
            .unwrap()
            .insert((keyword.into(), location.into()), Ok(candidates));
        self
    }

    /// Fail the combination with a browser error carrying `message`.
    pub fn with_error(
        self,
        keyword: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.results
            .write()
            .unwrap()
            .insert((keyword.into(), location.into()), Err(message.into()));
        self
    }

    /// Combinations searched, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SearchScraper for MockExtractor {
    fn source(&self) -> JobSource {
        self.source
    }

    async fn scrape_search(
        &self,
        _ctx: &ScrapeContext<'_>,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<JobCandidate>> {
        let key = (keyword.to_string(), location.to_string());
        self.calls.write().unwrap().push(key.clone());

        match self.results.read().unwrap().get(&key) {
            Some(Ok(candidates)) => Ok(candidates.clone()),
            Some(Err(message)) => Err(BrowserError::Protocol(message.clone()).into()),
            None => Ok(Vec::new()),
        }
    }

    async fn parse_job(&self, _ctx: &ScrapeContext<'_>, _card: &ResultCard) -> Option<JobCandidate> {
        None
    }
}

/// Builder for valid peer-support candidates with sensible defaults.
///
/// The default description repeats the title, so peer-support titles pass
/// the content filter.
pub struct CandidateBuilder {
    candidate: JobCandidate,
}

impl CandidateBuilder {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        let title = title.into();
        let company = company.into();
        let url = format!(
            "https://www.indeed.com/viewjob?jk={}-{}",
            slug(&company),
            slug(&title)
        );
        Self {
            candidate: JobCandidate {
                description: format!("Join our team as a {}.", title),
                title,
                company,
                location: "New York, NY".to_string(),
                salary: None,
                url,
                source: JobSource::Indeed,
                job_type: Some(JobType::FullTime),
                certifications_req: Vec::new(),
                specialty: Some(Specialty::GeneralPeerSupport),
                posted_date: None,
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.candidate.description = description.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.candidate.url = url.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.candidate.location = location.into();
        self
    }

    pub fn source(mut self, source: JobSource) -> Self {
        self.candidate.source = source;
        self
    }

    pub fn salary(mut self, salary: impl Into<String>) -> Self {
        self.candidate.salary = Some(salary.into());
        self
    }

    pub fn certifications(mut self, certifications: Vec<Certification>) -> Self {
        self.candidate.certifications_req = certifications;
        self
    }

    pub fn build(self) -> JobCandidate {
        self.candidate
    }
}

fn slug(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
