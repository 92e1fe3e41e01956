//! Browser rendering behind a narrow session interface.
//!
//! The pipeline and the interaction routines only see [`RenderEngine`] and
//! [`RenderSession`]; the WebDriver implementation lives in [`webdriver`].

pub mod interact;
pub mod webdriver;

#[cfg(test)]
pub mod fake;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RenderError;

/// Opaque reference to an element found by [`RenderSession::query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub usize);

/// How an interaction routine finds the elements it acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// A CSS selector
    Css(&'static str),
    /// Elements with the given tag whose text contains `text`, ignoring case
    Text { tag: &'static str, text: &'static str },
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Css(css) => write!(f, "{css}"),
            Matcher::Text { tag, text } => write!(f, "{tag}:has-text(\"{text}\")"),
        }
    }
}

/// Creates isolated browser sessions
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One live browser tab, owned by a single request
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url` and wait for the network to go idle
    async fn load(&mut self, url: &str) -> Result<(), RenderError>;

    async fn query(&mut self, matcher: &Matcher) -> Result<Vec<ElementHandle>, RenderError>;

    async fn is_visible(&mut self, element: ElementHandle) -> Result<bool, RenderError>;

    async fn click(&mut self, element: ElementHandle) -> Result<(), RenderError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError>;

    async fn scroll_height(&mut self) -> Result<u64, RenderError>;

    /// Wait until no new network activity has been seen for the idle window
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), RenderError>;

    async fn current_url(&mut self) -> Result<String, RenderError>;

    async fn current_markup(&mut self) -> Result<String, RenderError>;

    /// End the browser session
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_descriptions() {
        assert_eq!(Matcher::Css("[role=\"tab\"]").to_string(), "[role=\"tab\"]");
        assert_eq!(
            Matcher::Text {
                tag: "button",
                text: "Load more"
            }
            .to_string(),
            "button:has-text(\"Load more\")"
        );
    }
}
