//! Fixture HTML and engine setup for mock-browser tests.

use std::sync::Arc;
use std::time::Duration;

use job_scraper::testing::MockLauncher;
use job_scraper::{Engine, EngineOptions, JobSource, MemoryStore, SourceConfig};

pub const INDEED: &str = "https://www.indeed.com";

/// A result card as Indeed renders it.
pub struct Card<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    pub href: &'a str,
    pub salary: Option<&'a str>,
    pub posted: Option<&'a str>,
}

impl<'a> Card<'a> {
    pub fn new(title: &'a str, company: &'a str, href: &'a str) -> Self {
        Self {
            title,
            company,
            location: "New York, NY",
            href,
            salary: None,
            posted: None,
        }
    }

    pub fn location(mut self, location: &'a str) -> Self {
        self.location = location;
        self
    }

    pub fn salary(mut self, salary: &'a str) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn posted(mut self, posted: &'a str) -> Self {
        self.posted = Some(posted);
        self
    }

    fn render(&self) -> String {
        let mut html = format!(
            r#"<div class="job_seen_beacon">
  <h2 class="jobTitle"><a href="{}"><span>{}</span></a></h2>
  <span data-testid="company-name">{}</span>
  <div data-testid="text-location">{}</div>"#,
            self.href, self.title, self.company, self.location
        );
        if let Some(salary) = self.salary {
            html.push_str(&format!(r#"<div class="salary-snippet">{}</div>"#, salary));
        }
        if let Some(posted) = self.posted {
            html.push_str(&format!(r#"<span class="date">{}</span>"#, posted));
        }
        html.push_str("</div>");
        html
    }
}

/// An Indeed search results page holding `cards`.
pub fn indeed_results(cards: &[Card<'_>]) -> String {
    let body: String = cards.iter().map(Card::render).collect();
    format!(
        r#"<html><body><div id="mosaic-provider-jobcards">{}</div></body></html>"#,
        body
    )
}

/// An Indeed detail page with `description` in the description element.
pub fn indeed_detail(description: &str) -> String {
    format!(
        r#"<html><body><div id="jobDescriptionText"><p>{}</p></div></body></html>"#,
        description
    )
}

pub fn indeed_search_url(keyword: &str, location: &str, page: u32) -> String {
    job_scraper::IndeedScraper::search_url(INDEED, keyword, location, page)
}

/// Indeed's real selectors narrowed to one keyword and location, no pacing.
pub fn indeed_config(keyword: &str, location: &str, max_pages: u32) -> SourceConfig {
    JobSource::Indeed
        .config()
        .expect("Indeed is configured")
        .with_keywords([keyword])
        .with_locations([location])
        .with_max_pages(max_pages)
        .with_rate_limit(Duration::ZERO)
}

pub fn engine(launcher: &MockLauncher, store: &Arc<MemoryStore>) -> Engine {
    Engine::new(Arc::new(launcher.clone()), store.clone())
        .with_options(EngineOptions::default().without_retries())
}
