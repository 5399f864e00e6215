//! Page capabilities the collector depends on.
//!
//! A page is ambient DOM state (`scrollHeight`, `window.scrollTo`,
//! `querySelectorAll`); here it becomes an explicit dependency so the
//! collection loop can be exercised against scripted pages in tests and
//! against a real Chromium page in production.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a page implementation.
///
/// Collection itself has no failure modes: an empty scan and a stable extent
/// are both successful outcomes. These errors only describe transport-level
/// trouble between the harvester and the page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("CDP evaluation failed: {0}")]
    Cdp(String),
    #[error("page returned unexpected payload: {0}")]
    Payload(String),
    #[error("browser runtime not initialized")]
    NotInitialized,
}

/// A live page that lazily renders content as its scroll position advances.
///
/// Three capabilities back the collection loop: reading the current content
/// extent (total scrollable length, the growth proxy), requesting a scroll to
/// an absolute position, and enumerating the display text of every currently
/// rendered comment node in document traversal order.
#[async_trait]
pub trait HarvestPage: Send + Sync {
    /// Current total scrollable extent of the page.
    async fn content_extent(&self) -> Result<f64, PageError>;

    /// Request a scroll to the given absolute position.
    async fn scroll_to(&self, extent: f64) -> Result<(), PageError>;

    /// Display text of every comment node currently rendered, in document
    /// traversal order. Duplicates across calls are expected; an empty result
    /// is not an error.
    async fn comment_texts(&self, selector: &str) -> Result<Vec<String>, PageError>;
}
