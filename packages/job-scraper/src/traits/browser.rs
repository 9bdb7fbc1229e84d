//! Headless browser abstraction.
//!
//! A launcher starts one [`BrowserSession`]; the session hands out
//! [`BrowserPage`]s. Pages expose only what the extractors need: navigate,
//! wait for an element, and read back the rendered HTML. DOM queries happen
//! on that HTML snapshot (see `engine::dom`), not over the wire.
//!
//! Both `close` methods consume the box so a closed page or session cannot be
//! used again.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserResult;
use crate::sources::USER_AGENT;

/// How to start the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub user_agent: String,
    /// Width x height in CSS pixels
    pub viewport: (u32, u32),
    pub headless: bool,
    /// Explicit browser binary; autodetected when `None`
    pub executable: Option<PathBuf>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            viewport: (1920, 1080),
            headless: true,
            executable: None,
        }
    }
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> BrowserResult<Box<dyn BrowserSession>>;
}

/// One running browser, exclusively owned by a scrape run.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a blank tab.
    async fn new_page(&self) -> BrowserResult<Box<dyn BrowserPage>>;

    /// Shut the browser down.
    async fn close(self: Box<Self>) -> BrowserResult<()>;
}

/// One tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait for the load to settle, failing after `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Wait until `selector` matches at least one element.
    ///
    /// Returns `BrowserError::Timeout` if nothing matched within `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> BrowserResult<String>;

    async fn close(self: Box<Self>) -> BrowserResult<()>;
}
