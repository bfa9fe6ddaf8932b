//! Browser abstraction used by the login flow.
//!
//! The flow logic talks to a [`PageDriver`] trait object rather than a
//! concrete WebDriver client, so flow behavior can be tested against a
//! scripted in-memory page.

pub(crate) mod webdriver;

pub use webdriver::WebDriverPage;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::Result;

/// Element locator strategies supported by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Css(&'static str),
    Id(&'static str),
    XPath(&'static str),
}

impl Selector {
    /// The raw locator string, regardless of strategy.
    pub fn raw(&self) -> &'static str {
        match self {
            Selector::Css(s) | Selector::Id(s) | Selector::XPath(s) => s,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{}", s),
            Selector::Id(s) => write!(f, "id:{}", s),
            Selector::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// Async facade over a live browser page.
///
/// Bounded waits report their outcome in the return value: `Ok(true)`
/// when the condition was met, `Ok(false)` when the wait elapsed.
/// `Err` is reserved for transport and protocol failures.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Current browser URL as a string.
    async fn current_url(&self) -> Result<String>;

    /// Waits until the element is present, up to `timeout`.
    async fn wait_for_element(&self, selector: &Selector, timeout: Duration) -> Result<bool>;

    /// Waits for the element and clicks it. `Ok(false)` means it never
    /// appeared within the timeout.
    async fn click(&self, selector: &Selector, timeout: Duration) -> Result<bool>;

    /// Waits for the element, clears it, and types `text` into it.
    async fn fill(&self, selector: &Selector, text: &str, timeout: Duration) -> Result<bool>;

    /// Polls the browser URL until it contains `needle`, up to `timeout`.
    async fn wait_for_url_contains(&self, needle: &str, timeout: Duration) -> Result<bool>;

    /// Number of elements currently matching the selector.
    async fn element_count(&self, selector: &Selector) -> Result<usize>;

    /// Visible text of the page body.
    async fn page_text(&self) -> Result<String>;

    /// Captures a PNG screenshot of the viewport to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Ends the browser session. Safe to call exactly once per run.
    async fn close(&self) -> Result<()>;
}
