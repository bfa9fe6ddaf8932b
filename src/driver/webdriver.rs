//! Fantoccini-backed implementation of the [`PageDriver`] facade.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::driver::{PageDriver, Selector};

/// Poll interval for URL-change waits.
const URL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A live Chrome page reached through a WebDriver endpoint.
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    /// Creates a browser session against the configured WebDriver
    /// endpoint with headless Chrome capabilities.
    pub async fn connect(config: &Config) -> Result<Self> {
        let (width, height) = config.window_size;
        let window_arg = format!("--window-size={},{}", width, height);

        let mut caps = serde_json::map::Map::new();
        let mut chrome_opts = serde_json::map::Map::new();

        let args = vec![
            "--headless=new",
            "--no-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            window_arg.as_str(),
            "--disable-extensions",
            "--disable-background-networking",
            "--disable-sync",
            "--disable-translate",
            "--mute-audio",
            "--log-level=1",
        ];
        chrome_opts.insert("args".to_string(), serde_json::json!(args));
        caps.insert("browserName".to_string(), serde_json::json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!(chrome_opts),
        );

        debug!(target: "login_flow", "Connecting to WebDriver at {}...", config.webdriver_url);
        let mut builder = ClientBuilder::native();
        let builder = builder.capabilities(caps);
        let client = match builder.connect(&config.webdriver_url).await {
            Ok(client) => {
                debug!(target: "login_flow", "WebDriver session established");
                client
            }
            Err(e) => {
                return Err(AppError::WebDriverConnection(format!(
                    "Could not create session at {}: {}",
                    config.webdriver_url, e
                )));
            }
        };

        if let Err(e) = client.set_window_size(width, height).await {
            warn!(target: "login_flow", "Failed to set window size: {}", e);
        }

        Ok(WebDriverPage { client })
    }

    fn locator(selector: &Selector) -> Locator<'static> {
        match selector {
            Selector::Css(s) => Locator::Css(s),
            Selector::Id(s) => Locator::Id(s),
            Selector::XPath(s) => Locator::XPath(s),
        }
    }
}

/// Maps a bounded-wait result into the facade's `Ok(bool)` contract,
/// letting non-timeout errors propagate.
fn classify_wait<T>(result: std::result::Result<T, CmdError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CmdError::WaitTimeout) => Ok(None),
        Err(e) => Err(AppError::from(e)),
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(target: "login_flow", "Navigating to: {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.client.current_url().await?;
        Ok(url.to_string())
    }

    async fn wait_for_element(&self, selector: &Selector, timeout: Duration) -> Result<bool> {
        debug!(target: "login_flow", "Waiting for element: {}", selector);
        let found = classify_wait(
            self.client
                .wait()
                .at_most(timeout)
                .for_element(Self::locator(selector))
                .await,
        )?;
        Ok(found.is_some())
    }

    async fn click(&self, selector: &Selector, timeout: Duration) -> Result<bool> {
        debug!(target: "login_flow", "Waiting to click: {}", selector);
        let element = match classify_wait(
            self.client
                .wait()
                .at_most(timeout)
                .for_element(Self::locator(selector))
                .await,
        )? {
            Some(element) => element,
            None => return Ok(false),
        };

        element.click().await?;
        // Brief pause to allow the page to respond.
        sleep(Duration::from_millis(300)).await;
        Ok(true)
    }

    async fn fill(&self, selector: &Selector, text: &str, timeout: Duration) -> Result<bool> {
        debug!(target: "login_flow", "Waiting for input: {}", selector);
        let input = match classify_wait(
            self.client
                .wait()
                .at_most(timeout)
                .for_element(Self::locator(selector))
                .await,
        )? {
            Some(input) => input,
            None => return Ok(false),
        };

        input.clear().await?;
        input.send_keys(text).await?;
        sleep(Duration::from_millis(300)).await;
        Ok(true)
    }

    async fn wait_for_url_contains(&self, needle: &str, timeout: Duration) -> Result<bool> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let url = self.client.current_url().await?;
            if url.as_str().contains(needle) {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                debug!(
                    target: "login_flow",
                    "URL did not reach '{}' within {:?} (still at {})", needle, timeout, url
                );
                return Ok(false);
            }
            sleep(URL_POLL_INTERVAL).await;
        }
    }

    async fn element_count(&self, selector: &Selector) -> Result<usize> {
        let elements = self.client.find_all(Self::locator(selector)).await?;
        Ok(elements.len())
    }

    async fn page_text(&self) -> Result<String> {
        let body = self.client.find(Locator::Css("body")).await?;
        Ok(body.text().await?)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self.client.screenshot().await?;
        std::fs::write(path, png)?;
        debug!(target: "login_flow", "Screenshot written to {}", path.display());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Client is a cloneable handle; close consumes one handle and
        // tears down the underlying session.
        self.client.clone().close().await?;
        Ok(())
    }
}
