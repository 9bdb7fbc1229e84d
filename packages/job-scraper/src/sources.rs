//! Static per-source descriptors.
//!
//! Every `JobSource` maps to either a full [`SourceConfig`] or `None` (not yet
//! supported). The match in [`JobSource::config`] is exhaustive, so adding a
//! source forces a decision here.

use std::time::Duration;

use serde::Serialize;

use crate::types::JobSource;

/// User agent presented to every job board.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Search phrases for peer-support roles.
pub const PEER_SEARCH_KEYWORDS: &[&str] = &[
    "peer specialist",
    "peer advocate",
    "recovery coach",
    "certified recovery peer advocate",
    "peer counselor",
    "peer support specialist",
];

/// NYC search locations.
pub const NYC_LOCATIONS: &[&str] = &[
    "New York, NY",
    "Brooklyn, NY",
    "Manhattan, NY",
    "Queens, NY",
    "Bronx, NY",
    "Staten Island, NY",
];

/// CSS selectors for one board's result cards and detail pages.
///
/// Card-level selectors are evaluated relative to a `job_card` element;
/// `description` is evaluated against the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selectors {
    pub job_card: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Anchor whose `href` is the detail link
    pub url: String,
    pub description: String,
    pub salary: Option<String>,
    pub posted_date: Option<String>,
    pub next_page: Option<String>,
}

impl Selectors {
    pub fn new(
        job_card: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            job_card: job_card.into(),
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url: url.into(),
            description: description.into(),
            salary: None,
            posted_date: None,
            next_page: None,
        }
    }

    pub fn with_salary(mut self, selector: impl Into<String>) -> Self {
        self.salary = Some(selector.into());
        self
    }

    pub fn with_posted_date(mut self, selector: impl Into<String>) -> Self {
        self.posted_date = Some(selector.into());
        self
    }

    pub fn with_next_page(mut self, selector: impl Into<String>) -> Self {
        self.next_page = Some(selector.into());
        self
    }
}

/// Everything the engine needs to scrape one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceConfig {
    pub source: JobSource,
    pub base_url: String,
    pub search_keywords: Vec<String>,
    pub search_locations: Vec<String>,
    pub max_pages: u32,
    /// Fixed pause after each combination and between result pages
    pub rate_limit: Duration,
    pub selectors: Selectors,
}

impl SourceConfig {
    /// A config over the default keyword and NYC location lists.
    pub fn new(
        source: JobSource,
        base_url: impl Into<String>,
        max_pages: u32,
        rate_limit: Duration,
        selectors: Selectors,
    ) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            search_keywords: PEER_SEARCH_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            search_locations: NYC_LOCATIONS.iter().map(|s| s.to_string()).collect(),
            max_pages,
            rate_limit,
            selectors,
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Number of keyword x location combinations in one run.
    pub fn combinations(&self) -> usize {
        self.search_keywords.len() * self.search_locations.len()
    }
}

impl JobSource {
    /// The registered configuration, or `None` for boards not yet supported.
    pub fn config(&self) -> Option<SourceConfig> {
        match self {
            JobSource::Indeed => Some(indeed()),
            JobSource::LinkedIn => Some(linkedin()),
            JobSource::HealthcareJobSite => Some(healthcare_job_site()),
            JobSource::BehavioralHealthJobs => None,
        }
    }
}

fn indeed() -> SourceConfig {
    SourceConfig::new(
        JobSource::Indeed,
        "https://www.indeed.com",
        3,
        Duration::from_millis(2000),
        Selectors::new(
            ".job_seen_beacon",
            "h2.jobTitle",
            r#"[data-testid="company-name"]"#,
            r#"[data-testid="text-location"]"#,
            "h2.jobTitle a",
            "#jobDescriptionText",
        )
        .with_salary(".salary-snippet")
        .with_posted_date(".date")
        .with_next_page(r#"[data-testid="pagination-page-next"]"#),
    )
}

// LinkedIn throttles harder, so fewer pages and a longer pause.
fn linkedin() -> SourceConfig {
    SourceConfig::new(
        JobSource::LinkedIn,
        "https://www.linkedin.com",
        2,
        Duration::from_millis(3000),
        Selectors::new(
            ".job-search-card",
            ".job-search-card__title",
            ".job-search-card__company-name",
            ".job-search-card__location",
            ".job-search-card__title-link",
            ".description__text",
        )
        .with_salary(".job-search-card__salary-info")
        .with_posted_date(".job-search-card__listdate"),
    )
}

fn healthcare_job_site() -> SourceConfig {
    SourceConfig::new(
        JobSource::HealthcareJobSite,
        "https://www.healthcarejobsite.com",
        3,
        Duration::from_millis(1500),
        Selectors::new(
            ".job-listing",
            ".job-title",
            ".company-name",
            ".job-location",
            ".job-title a",
            ".job-description",
        )
        .with_salary(".salary")
        .with_posted_date(".posted-date"),
    )
}
