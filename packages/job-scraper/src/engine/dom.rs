//! DOM extraction over an HTML snapshot.
//!
//! Pages are read back as HTML and queried here with `scraper`. Everything in
//! this module is synchronous; `scraper::Html` is not `Send` and must never be
//! held across an `.await`.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::warn;

use crate::normalize::clean_text;
use crate::sources::Selectors;

/// The raw fields of one search-result card, cleaned but not normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub posted_date: Option<String>,
    /// `href` of the detail link, possibly relative
    pub link: Option<String>,
}

/// Parse a CSS selector, logging instead of failing on bad syntax.
fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(selector, error = %e, "Invalid CSS selector");
            None
        }
    }
}

/// Whether `selector` matches anything in `html`.
pub fn has_match(html: &str, selector: &str) -> bool {
    let Some(selector) = parse_selector(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

/// Cleaned text content of the first element under `root` matching `selector`.
///
/// Returns `None` when nothing matches or the text is blank.
pub fn extract_text(root: &ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = parse_selector(selector)?;
    let element = root.select(&selector).next()?;
    let text = clean_text(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Cleaned `attribute` of the first element under `root` matching `selector`.
pub fn extract_attribute(root: &ElementRef<'_>, selector: &str, attribute: &str) -> Option<String> {
    let selector = parse_selector(selector)?;
    let value = root.select(&selector).next()?.value().attr(attribute)?;
    let value = clean_text(value);
    (!value.is_empty()).then_some(value)
}

/// Every result card on a search page, in document order.
pub fn read_cards(html: &str, selectors: &Selectors) -> Vec<ResultCard> {
    let Some(card_selector) = parse_selector(&selectors.job_card) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&card_selector)
        .map(|card| ResultCard {
            title: extract_text(&card, &selectors.title),
            company: extract_text(&card, &selectors.company),
            location: extract_text(&card, &selectors.location),
            salary: selectors
                .salary
                .as_deref()
                .and_then(|s| extract_text(&card, s)),
            posted_date: selectors
                .posted_date
                .as_deref()
                .and_then(|s| extract_text(&card, s)),
            link: extract_attribute(&card, &selectors.url, "href"),
        })
        .collect()
}

/// Text of the description element on a detail page.
pub fn read_description(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    extract_text(&document.root_element(), selector)
}
