//! Headless Chromium over the DevTools protocol (chromiumoxide).

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{retry, RetryPolicy};
use crate::error::{BrowserError, BrowserResult};
use crate::traits::browser::{BrowserLauncher, BrowserPage, BrowserSession, LaunchOptions};

/// How often `wait_for_selector` re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches a local Chromium, retrying flaky starts.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    launch_retry: RetryPolicy,
}

impl Default for ChromiumLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self {
            launch_retry: RetryPolicy::default(),
        }
    }

    pub fn with_launch_retry(mut self, policy: RetryPolicy) -> Self {
        self.launch_retry = policy;
        self
    }

    fn browser_config(options: &LaunchOptions) -> BrowserResult<BrowserConfig> {
        let (width, height) = options.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(Some(Viewport {
                width,
                height,
                ..Default::default()
            }))
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", options.user_agent));

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, options: &LaunchOptions) -> BrowserResult<Box<dyn BrowserSession>> {
        let config = Self::browser_config(options)?;
        info!(headless = options.headless, "Launching Chromium");

        let (browser, mut handler) = retry(self.launch_retry, || {
            let config = config.clone();
            async move {
                Browser::launch(config)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))
            }
        })
        .await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler error");
                }
            }
        });

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(browser),
            handler_task,
        }))
    }
}

pub struct ChromiumSession {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_page(&self) -> BrowserResult<Box<dyn BrowserPage>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Protocol(format!("failed to open page: {}", e)))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        let ChromiumSession {
            browser,
            handler_task,
        } = *self;
        let mut browser = browser.into_inner();

        let closed = browser
            .close()
            .await
            .map_err(|e| BrowserError::Protocol(format!("failed to close browser: {}", e)));
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        handler_task.abort();

        closed.map(|_| ())
    }
}

pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            }),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("selector {}", selector),
                    after: timeout,
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn content(&self) -> BrowserResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }
}
