//! Site-specific extractors.
//!
//! Each board only differs in its search-URL convention and in how a detail
//! link is canonicalized; pagination and candidate assembly are shared here.

pub mod indeed;
pub mod linkedin;

pub use indeed::IndeedScraper;
pub use linkedin::LinkedInScraper;

use tracing::{debug, info, warn};
use url::Url;

use crate::classify::{infer_job_type, infer_specialty};
use crate::engine::dom::{self, ResultCard};
use crate::engine::ScrapeContext;
use crate::error::Result;
use crate::normalize::{extract_certifications, format_location, format_salary, parse_date};
use crate::traits::extractor::SearchScraper;
use crate::types::JobCandidate;

/// Location assumed when a card carries none.
pub const DEFAULT_LOCATION: &str = "New York, NY";

/// Walk result pages `0..max_pages` for one combination.
///
/// `page_url` maps a zero-based page index to its search URL. Pagination
/// stops at the first page whose cards never appear or that has no cards.
/// A navigation failure on the first page is an error for the combination;
/// on later pages it just ends pagination.
pub async fn paginate<E, F>(
    extractor: &E,
    ctx: &ScrapeContext<'_>,
    keyword: &str,
    location: &str,
    page_url: F,
) -> Result<Vec<JobCandidate>>
where
    E: SearchScraper + ?Sized,
    F: Fn(u32) -> String,
{
    let config = ctx.config();
    let mut jobs = Vec::new();

    for page in 0..config.max_pages {
        if ctx.is_cancelled() {
            break;
        }

        let url = page_url(page);
        debug!(page = page + 1, url = %url, "Navigating to results page");

        let html = match load_results(ctx, &url).await {
            Ok(Some(html)) => html,
            Ok(None) => {
                info!(page = page + 1, "No job cards found, stopping pagination");
                break;
            }
            Err(e) if page == 0 => return Err(e.into()),
            Err(e) => {
                warn!("Error on page {}: {}", page + 1, e);
                break;
            }
        };

        let cards = dom::read_cards(&html, &config.selectors);
        if cards.is_empty() {
            info!(page = page + 1, "No more jobs found, stopping pagination");
            break;
        }
        debug!(page = page + 1, cards = cards.len(), "Found job cards");

        for card in &cards {
            if let Some(job) = extractor.parse_job(ctx, card).await {
                jobs.push(job);
            }
        }

        ctx.pace().await;
    }

    info!("Scraped {} jobs for \"{}\" in {}", jobs.len(), keyword, location);
    Ok(jobs)
}

/// Navigate to a results page and return its HTML, or `None` when the card
/// selector never showed up.
async fn load_results(
    ctx: &ScrapeContext<'_>,
    url: &str,
) -> crate::error::BrowserResult<Option<String>> {
    ctx.navigate_with_retry(url).await?;
    let card_selector = &ctx.config().selectors.job_card;
    if !ctx
        .wait_for_selector(card_selector, ctx.options().selector_timeout)
        .await
    {
        return Ok(None);
    }
    ctx.page_content().await.map(Some)
}

/// Absolute detail URL for a card that has a title, a company, and a link.
///
/// Relative links resolve against the source's base URL.
pub fn card_link(ctx: &ScrapeContext<'_>, card: &ResultCard) -> Option<Url> {
    if card.title.is_none() || card.company.is_none() {
        return None;
    }
    let link = card.link.as_deref()?;
    match resolve_link(&ctx.config().base_url, link) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(link, error = %e, "Unresolvable job link");
            None
        }
    }
}

pub fn resolve_link(base_url: &str, link: &str) -> std::result::Result<Url, url::ParseError> {
    Url::parse(base_url)?.join(link)
}

/// Fetch the description behind `url` and assemble a normalized candidate.
///
/// Returns `None` if the card is incomplete or the description is unavailable.
pub async fn build_candidate(
    ctx: &ScrapeContext<'_>,
    card: &ResultCard,
    url: Url,
) -> Option<JobCandidate> {
    let title = card.title.clone()?;
    let company = card.company.clone()?;
    let url = String::from(url);

    let description = ctx.fetch_description(&url).await?;

    Some(JobCandidate {
        job_type: Some(infer_job_type(&title, &description)),
        specialty: Some(infer_specialty(&description)),
        certifications_req: extract_certifications(&description),
        location: format_location(card.location.as_deref().unwrap_or(DEFAULT_LOCATION)),
        salary: format_salary(card.salary.as_deref()),
        posted_date: parse_date(card.posted_date.as_deref()),
        source: ctx.config().source,
        title,
        company,
        url,
        description,
    })
}
