//! Headless browser capabilities
//!
//! The crawler never talks to a browser directly. It drives pages through
//! three small traits:
//!
//! - [`Renderer`] opens a rendered session for a URL
//! - [`RenderedSession`] is one live page (a browser tab)
//! - [`ElementHandle`] is one element inside that page
//!
//! [`ChromeRenderer`] implements them on top of `chromiumoxide`. Tests use an
//! in-memory page instead.

mod chrome;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use chrome::ChromeRenderer;

/// Errors raised by a rendered session
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page load for {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("DevTools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("Script returned unexpected value: {0}")]
    Script(String),

    #[error("Failed to decode script result: {0}")]
    Json(#[from] serde_json::Error),
}

/// One element of a rendered page
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Attribute value, `None` when absent
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError>;

    /// Rendered text content
    async fn text(&self) -> Result<String, BrowserError>;

    /// True when the element takes up space and is not hidden
    async fn is_visible(&self) -> Result<bool, BrowserError>;

    /// Class attributes of the parent and grandparent, nearest first
    async fn ancestor_classes(&self) -> Result<Vec<String>, BrowserError>;

    async fn scroll_into_view(&self) -> Result<(), BrowserError>;

    /// Native click through the input pipeline
    async fn click(&self) -> Result<(), BrowserError>;

    /// Script-dispatched click, for elements the native click cannot reach
    async fn force_click(&self) -> Result<(), BrowserError>;
}

/// A live rendered page
///
/// Sessions are never shared between tasks. Callers must call
/// [`RenderedSession::close`] on every exit path.
#[async_trait]
pub trait RenderedSession: Send + Sync {
    /// The URL the session was opened for
    fn url(&self) -> &str;

    /// Absolute `href` of every anchor currently in the DOM
    async fn current_links(&self) -> Result<Vec<String>, BrowserError>;

    /// Serialized DOM
    async fn content(&self) -> Result<String, BrowserError>;

    /// Elements matching a CSS selector, in document order
    async fn find_elements(&self, selector: &str)
        -> Result<Vec<Box<dyn ElementHandle>>, BrowserError>;

    /// History back by one entry
    async fn go_back(&self) -> Result<(), BrowserError>;

    /// Scrolls the window to the bottom of the document
    async fn scroll_to_bottom(&self) -> Result<(), BrowserError>;

    /// Current scroll height of the document body
    async fn document_height(&self) -> Result<u64, BrowserError>;

    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Opens rendered sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn RenderedSession>, BrowserError>;
}
