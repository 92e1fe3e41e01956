use thiserror::Error;

/// Failures of the static HTTP attempt
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the fetch timeout
    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    /// The server answered with a non-2xx status
    #[error("HTTP error: {0}")]
    Status(u16),

    /// Connection, DNS, TLS or body read failure
    #[error("Failed to fetch URL: {0}")]
    Request(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(timeout_secs)
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

/// Failures of the browser session
#[derive(Debug, Error)]
pub enum RenderError {
    /// No WebDriver server accepted a new session
    #[error("Browser error: {0}")]
    Connect(String),

    /// The browser could not navigate to the page
    #[error("Failed to load page: {0}")]
    Navigation(String),

    /// A bounded wait ran out
    #[error("{what} timeout after {after_ms}ms")]
    Timeout { what: &'static str, after_ms: u64 },

    /// A WebDriver command failed
    #[error("WebDriver command failed: {0}")]
    Command(String),

    /// A script evaluated in the page returned something unusable
    #[error("Script error: {0}")]
    Script(String),

    /// The handle does not belong to this session
    #[error("Unknown element handle {0}")]
    StaleHandle(usize),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}

impl From<fantoccini::error::CmdError> for RenderError {
    fn from(error: fantoccini::error::CmdError) -> Self {
        RenderError::Command(error.to_string())
    }
}

/// Failures turning markup into sections
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse HTML: document is empty")]
    EmptyDocument,
}

/// Rejections of a scrape request before any work is done
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing url")]
    MissingUrl,

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Only http:// and https:// URLs are supported, got {0}://")]
    UnsupportedScheme(String),
}
