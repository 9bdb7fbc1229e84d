//! Pure text normalization for scraped postings.
//!
//! Everything here operates on strings already pulled out of markup:
//! whitespace cleanup, salary and date normalization, certification
//! extraction, the peer-support content filter, and duplicate detection.

use std::collections::HashSet;

use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{Certification, ExistingJob, JobCandidate};

/// Location used when a card carries none.
pub const LOCATION_NOT_SPECIFIED: &str = "Location Not Specified";

/// Title similarity above which two postings from one company are the same job.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Phrases that mark a posting as a peer-support role.
pub const PEER_SUPPORT_KEYWORDS: &[&str] = &[
    "peer specialist",
    "peer advocate",
    "peer counselor",
    "peer support",
    "recovery coach",
    "crpa",
    "certified recovery peer advocate",
    "certified peer specialist",
    "peer recovery specialist",
    "behavioral health peer",
    "mental health peer",
    "substance use peer",
    "addiction peer",
];

lazy_static! {
    static ref HORIZONTAL_WS: Regex = Regex::new(r"[^\S\n]+").unwrap();
    static ref NEWLINE_RUN: Regex = Regex::new(r"[^\S\n]*\n\s*").unwrap();
    static ref ANY_WS: Regex = Regex::new(r"\s+").unwrap();

    static ref SALARY_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?i)\$[\d,]+(?:\.\d{2})?\s*-\s*\$[\d,]+(?:\.\d{2})?").unwrap(),
        Regex::new(r"(?i)\$[\d,]+(?:\.\d{2})?").unwrap(),
        Regex::new(r"(?i)[\d,]+(?:\.\d{2})?\s*-\s*[\d,]+(?:\.\d{2})?").unwrap(),
    ];

    static ref DAYS_AGO: Regex = Regex::new(r"(\d+)\s*days?\s*ago").unwrap();
    static ref WEEKS_AGO: Regex = Regex::new(r"(\d+)\s*weeks?\s*ago").unwrap();
    static ref MONTHS_AGO: Regex = Regex::new(r"(\d+)\s*months?\s*ago").unwrap();

    static ref CERTIFICATION_PATTERNS: Vec<(Regex, Certification)> = vec![
        (Regex::new(r"(?i)crpa|certified recovery peer advocate").unwrap(), Certification::Crpa),
        (Regex::new(r"(?i)\bcps\b|certified peer specialist").unwrap(), Certification::Cps),
        (Regex::new(r"(?i)cprs|certified peer recovery specialist").unwrap(), Certification::Cprs),
        (Regex::new(r"(?i)\bcrs\b|certified recovery specialist").unwrap(), Certification::Crs),
        (
            Regex::new(r"(?i)casac|credentialed alcoholism and substance abuse counselor").unwrap(),
            Certification::Casac,
        ),
    ];

    static ref NYC_BOROUGH: Regex =
        Regex::new(r"(?i)brooklyn|manhattan|queens|bronx|staten island").unwrap();
    static ref NY_TOKEN: Regex = Regex::new(r"(?i)\bny\b").unwrap();
}

/// Collapse horizontal whitespace to single spaces and newline runs to a
/// single newline, then trim.
pub fn clean_text(text: &str) -> String {
    let spaced = HORIZONTAL_WS.replace_all(text, " ");
    NEWLINE_RUN.replace_all(&spaced, "\n").trim().to_string()
}

/// Normalize a salary snippet to `$X - $Y`, `$X`, or `X - Y`.
///
/// Returns the first pattern match verbatim, the cleaned input when no
/// pattern matches, and `None` for absent or blank input.
pub fn format_salary(salary: Option<&str>) -> Option<String> {
    let cleaned = ANY_WS.replace_all(salary?.trim(), " ").into_owned();
    if cleaned.is_empty() {
        return None;
    }

    SALARY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(&cleaned))
        .map(|m| m.as_str().to_string())
        .or(Some(cleaned))
}

/// Resolve relative ("3 days ago") or absolute posting dates against now.
pub fn parse_date(text: Option<&str>) -> Option<DateTime<Utc>> {
    parse_date_at(text, Utc::now())
}

/// [`parse_date`] with an explicit reference time.
///
/// Relative forms are checked in a fixed order: today / just posted,
/// yesterday, days, weeks, months. Anything else goes through a general
/// date parse.
pub fn parse_date_at(text: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = text?.trim();
    if raw.is_empty() {
        return None;
    }
    let lowered = raw.to_lowercase();

    if lowered.contains("today") || lowered.contains("just posted") {
        return Some(now);
    }
    if lowered.contains("yesterday") {
        return now.checked_sub_days(Days::new(1));
    }
    if let Some(days) = capture_count(&DAYS_AGO, &lowered) {
        return now.checked_sub_days(Days::new(days));
    }
    if let Some(weeks) = capture_count(&WEEKS_AGO, &lowered) {
        return now.checked_sub_days(Days::new(weeks.checked_mul(7)?));
    }
    if let Some(months) = capture_count(&MONTHS_AGO, &lowered) {
        return now.checked_sub_months(Months::new(u32::try_from(months).ok()?));
    }

    parse_absolute_date(raw)
}

fn capture_count(pattern: &Regex, text: &str) -> Option<u64> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_absolute_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Recognized certification codes mentioned in `text`, without duplicates.
pub fn extract_certifications(text: &str) -> Vec<Certification> {
    if text.is_empty() {
        return Vec::new();
    }
    CERTIFICATION_PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.is_match(text))
        .map(|(_, cert)| *cert)
        .collect()
}

/// True when title + description mention any peer-support keyword.
pub fn is_peer_support_job(title: &str, description: &str) -> bool {
    let combined = format!("{} {}", title, description).to_lowercase();
    PEER_SUPPORT_KEYWORDS
        .iter()
        .any(|keyword| combined.contains(keyword))
}

/// Jaccard similarity over lowercased whitespace tokens.
///
/// Identical strings (after lowercase + trim) score 1.0, including two
/// empty strings.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 1.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

/// Token-containment similarity used for duplicate titles.
///
/// Shared tokens over the smaller token set, so a title that only adds a
/// level suffix ("Peer Advocate" / "Peer Advocate II") still scores 1.0.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let smaller = words_a.len().min(words_b.len());
    if smaller == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / smaller as f64
}

/// Fields compared when deciding whether two postings are the same job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupKey<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub url: Option<&'a str>,
}

impl<'a> From<&'a JobCandidate> for DedupKey<'a> {
    fn from(job: &'a JobCandidate) -> Self {
        Self {
            title: &job.title,
            company: &job.company,
            url: Some(job.url.as_str()),
        }
    }
}

impl<'a> From<&'a ExistingJob> for DedupKey<'a> {
    fn from(job: &'a ExistingJob) -> Self {
        Self {
            title: &job.title,
            company: &job.company,
            url: Some(job.url.as_str()),
        }
    }
}

/// Same url, or near-identical title at the same company.
pub fn is_duplicate(a: DedupKey<'_>, b: DedupKey<'_>) -> bool {
    if let (Some(url_a), Some(url_b)) = (a.url, b.url) {
        if !url_a.is_empty() && url_a == url_b {
            return true;
        }
    }

    let same_company = a.company.trim().to_lowercase() == b.company.trim().to_lowercase();
    same_company && title_similarity(a.title, b.title) > TITLE_SIMILARITY_THRESHOLD
}

/// Clean a location, appending ", NY" to bare NYC borough names.
pub fn format_location(location: &str) -> String {
    let cleaned = clean_text(location);
    if cleaned.is_empty() {
        return LOCATION_NOT_SPECIFIED.to_string();
    }
    if NYC_BOROUGH.is_match(&cleaned) && !NY_TOKEN.is_match(&cleaned) {
        return format!("{}, NY", cleaned);
    }
    cleaned
}
