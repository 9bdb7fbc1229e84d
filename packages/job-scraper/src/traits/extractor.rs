//! Site-specific extraction capability.
//!
//! An extractor knows one board's search-URL convention and how to turn a
//! result card into a [`JobCandidate`]. The engine owns the browser and the
//! keyword x location loop; extractors only borrow it through
//! [`ScrapeContext`].

use async_trait::async_trait;

use crate::engine::dom::ResultCard;
use crate::engine::ScrapeContext;
use crate::error::Result;
use crate::types::{JobCandidate, JobSource};

#[async_trait]
pub trait SearchScraper: Send + Sync {
    /// The board this extractor handles.
    fn source(&self) -> JobSource;

    /// Walk the search results for one combination.
    ///
    /// Returns candidates in result order. An `Err` is recorded against the
    /// combination and the run moves on.
    async fn scrape_search(
        &self,
        ctx: &ScrapeContext<'_>,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<JobCandidate>>;

    /// Build a candidate from one result card.
    ///
    /// Returns `None` for incomplete cards or when the detail page yields no
    /// description. Those are expected and not errors.
    async fn parse_job(&self, ctx: &ScrapeContext<'_>, card: &ResultCard) -> Option<JobCandidate>;
}
