use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::engine::EngineOptions;
use crate::scheduler::DEFAULT_ARCHIVE_DAYS;
use crate::traits::browser::LaunchOptions;

/// Every six hours, on the hour.
pub const DEFAULT_SCHEDULE: &str = "0 0 */6 * * *";

/// Scraper configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub chrome_bin: Option<PathBuf>,
    pub headless: bool,
    pub schedule: String,
    pub archive_after_days: u32,
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    pub detail_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            chrome_bin: env::var("CHROME_BIN").ok().map(PathBuf::from),
            headless: parse_var("SCRAPER_HEADLESS", true)?,
            schedule: env::var("SCRAPE_SCHEDULE").unwrap_or_else(|_| DEFAULT_SCHEDULE.to_string()),
            archive_after_days: parse_var("ARCHIVE_AFTER_DAYS", DEFAULT_ARCHIVE_DAYS)?,
            navigation_timeout: Duration::from_secs(parse_var("NAVIGATION_TIMEOUT_SECS", 30)?),
            selector_timeout: Duration::from_secs(parse_var("SELECTOR_TIMEOUT_SECS", 10)?),
            detail_timeout: Duration::from_secs(parse_var("DETAIL_TIMEOUT_SECS", 15)?),
        })
    }

    /// Engine options with this config's browser and timeout overrides.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            launch: LaunchOptions {
                headless: self.headless,
                executable: self.chrome_bin.clone(),
                ..LaunchOptions::default()
            },
            navigation_timeout: self.navigation_timeout,
            selector_timeout: self.selector_timeout,
            detail_timeout: self.detail_timeout,
            ..EngineOptions::default()
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid {}", name, std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
