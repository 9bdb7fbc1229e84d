//! Indeed search results.
//!
//! Search URLs are `{base}/jobs?q=..&l=..&start=N` with ten results per page.

use async_trait::async_trait;

use super::{build_candidate, card_link, paginate};
use crate::engine::dom::ResultCard;
use crate::engine::ScrapeContext;
use crate::error::Result;
use crate::traits::extractor::SearchScraper;
use crate::types::{JobCandidate, JobSource};

const RESULTS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct IndeedScraper;

impl IndeedScraper {
    pub fn new() -> Self {
        Self
    }

    pub fn search_url(base_url: &str, keyword: &str, location: &str, page: u32) -> String {
        format!(
            "{}/jobs?q={}&l={}&start={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(keyword),
            urlencoding::encode(location),
            page * RESULTS_PER_PAGE
        )
    }
}

#[async_trait]
impl SearchScraper for IndeedScraper {
    fn source(&self) -> JobSource {
        JobSource::Indeed
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
        let url = card_link(ctx, card)?;
        build_candidate(ctx, card, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_and_offsets() {
        assert_eq!(
            IndeedScraper::search_url("https://www.indeed.com", "peer specialist", "New York, NY", 0),
            "https://www.indeed.com/jobs?q=peer%20specialist&l=New%20York%2C%20NY&start=0"
        );
        assert_eq!(
            IndeedScraper::search_url("https://www.indeed.com/", "recovery coach", "Bronx, NY", 2),
            "https://www.indeed.com/jobs?q=recovery%20coach&l=Bronx%2C%20NY&start=20"
        );
    }
}
