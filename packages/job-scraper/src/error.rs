//! Typed errors for the scraper pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Run-level calls turn
//! most of these into strings on `ScrapeResult::errors`; only database faults
//! in archival/query paths propagate to the trigger.

use std::time::Duration;

use thiserror::Error;

use crate::types::JobSource;

/// Errors raised while driving the headless browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Navigation to a URL failed
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A navigation or element wait exceeded its budget
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    /// Any other DevTools protocol failure
    #[error("browser protocol error: {0}")]
    Protocol(String),

    /// The session or page was already closed
    #[error("browser session closed")]
    Closed,
}

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A posting with the same (url, source) already exists
    #[error("duplicate job posting: {url}")]
    DuplicateKey { url: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row held a value outside the closed vocabularies
    #[error("corrupt row: {0}")]
    Corrupt(#[from] ParseError),
}

/// Candidate failed pre-persistence validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Unknown value for one of the closed enumerations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Errors that abort a scrape step.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Caller cancelled the run
    #[error("scrape cancelled")]
    Cancelled,

    /// Another scrape of the same source holds the lock
    #[error("scrape already running for {0}")]
    SourceBusy(JobSource),

    /// No configuration or extractor registered for the source
    #[error("no scraper configured for {0}")]
    NotConfigured(JobSource),
}

/// Result type alias for scrape operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for browser operations.
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
