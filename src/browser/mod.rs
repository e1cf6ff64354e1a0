//! What the page loop needs from a browser-like client.

pub mod dom;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),
    #[error("no element matches {0}")]
    NotFound(String),
    #[error("invalid selector {0:?}")]
    Selector(String),
    #[error("element from an earlier page is no longer attached")]
    StaleHandle,
    #[error("page fetch failed: {0}")]
    Fetch(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How to find a descendant inside a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// 1-based position among the row's direct `td` children.
    Column(usize),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(sel) => write!(f, "{}", sel),
            Locator::Column(n) => write!(f, "td[{}]", n),
        }
    }
}

/// A browser session driven by one owner for its whole life.
#[allow(async_fn_in_trait)]
pub trait Navigator {
    type Element: Clone;

    /// Block until at least one element matches `selector`.
    async fn wait_for_rows(&mut self, selector: &str, timeout: Duration) -> Result<(), NavError>;

    async fn find_rows(&mut self, selector: &str) -> Result<Vec<Self::Element>, NavError>;

    async fn inner_html(&mut self, element: &Self::Element) -> Result<String, NavError>;

    /// Rendered text of the first descendant of `row` matching `locator`.
    async fn descendant_text(
        &mut self,
        row: &Self::Element,
        locator: &Locator,
    ) -> Result<String, NavError>;

    async fn find_link_by_text(
        &mut self,
        text: &str,
        timeout: Duration,
    ) -> Result<Self::Element, NavError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), NavError>;

    /// Block until `element` is detached from the current page.
    async fn wait_until_stale(
        &mut self,
        element: &Self::Element,
        timeout: Duration,
    ) -> Result<(), NavError>;

    async fn quit(self) -> Result<(), NavError>;
}
