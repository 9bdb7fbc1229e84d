//! LinkedIn public job search.
//!
//! Search URLs are `{base}/jobs/search?keywords=..&location=..&start=N` with
//! 25 results per page. Detail links carry per-impression tracking
//! parameters, which are stripped so the same posting keeps the same url.

use async_trait::async_trait;

use super::{build_candidate, card_link, paginate};
use crate::engine::dom::ResultCard;
use crate::engine::ScrapeContext;
use crate::error::Result;
use crate::traits::extractor::SearchScraper;
use crate::types::{JobCandidate, JobSource};

const RESULTS_PER_PAGE: u32 = 25;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedInScraper;

impl LinkedInScraper {
    pub fn new() -> Self {
        Self
    }

    pub fn search_url(base_url: &str, keyword: &str, location: &str, page: u32) -> String {
        format!(
            "{}/jobs/search?keywords={}&location={}&start={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(keyword),
            urlencoding::encode(location),
            page * RESULTS_PER_PAGE
        )
    }
}

#[async_trait]
impl SearchScraper for LinkedInScraper {
    fn source(&self) -> JobSource {
        JobSource::LinkedIn
    }

    async fn scrape_search(
        &self,
        ctx: &ScrapeContext<'_>,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<JobCandidate>> {
        let base_url = ctx.config().base_url.as_str();
        paginate(self, ctx, keyword, location, |page| {
            Self::search_url(base_url, keyword, location, page)
        })
        .await
    }

    async fn parse_job(&self, ctx: &ScrapeContext<'_>, card: &ResultCard) -> Option<JobCandidate> {
        let mut url = card_link(ctx, card)?;
        url.set_query(None);
        url.set_fragment(None);
        build_candidate(ctx, card, url).await
    }
}
