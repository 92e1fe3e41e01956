use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RequestError;

/// A validated request to scrape one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    url: Url,
}

impl ScrapeRequest {
    /// Validate an absolute http(s) URL
    pub fn new(url: &str) -> Result<Self, RequestError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(RequestError::MissingUrl);
        }

        let parsed = Url::parse(trimmed).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(RequestError::UnsupportedScheme(other.to_string())),
        }
        if parsed.host_str().is_none() {
            return Err(RequestError::InvalidUrl(format!("{trimmed} has no host")));
        }

        Ok(Self { url: parsed })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Pipeline phase an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Fetch,
    Render,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub phase: Phase,
    pub message: String,
}

/// Document-level metadata; absent values serialize as null
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub canonical: Option<String>,
}

/// What the interaction routines did to the rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionLog {
    clicks: Vec<String>,
    scrolls: u32,
    pages: Vec<String>,
}

impl InteractionLog {
    /// Start a log whose first visited page is `url`
    pub fn starting_at(url: &Url) -> Self {
        Self {
            clicks: Vec::new(),
            scrolls: 0,
            pages: vec![url.to_string()],
        }
    }

    pub fn record_click(&mut self, description: impl Into<String>) {
        self.clicks.push(description.into());
    }

    pub fn record_scroll(&mut self) {
        self.scrolls += 1;
    }

    pub fn record_page(&mut self, url: impl Into<String>) {
        self.pages.push(url.into());
    }

    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    pub fn scrolls(&self) -> u32 {
        self.scrolls
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Nav,
    Footer,
    Hero,
    Pricing,
    Faq,
    Grid,
    List,
    Section,
}

/// Structured content extracted from one section node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub headings: Vec<String>,
    pub text: String,
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub lists: Vec<Vec<String>>,
    pub tables: Vec<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub label: String,
    pub source_url: String,
    pub content: ContentBlock,
    pub raw_html: String,
    pub truncated: bool,
}

/// The single output of a scrape request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub url: String,
    pub scraped_at: DateTime<Utc>,
    pub meta: Metadata,
    pub interactions: InteractionLog,
    pub sections: Vec<Section>,
    pub errors: Vec<ErrorRecord>,
}

/// Envelope returned by the HTTP surface and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub result: ScrapeResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_http_and_https() {
        assert!(ScrapeRequest::new("http://example.com").is_ok());
        let request = ScrapeRequest::new("  https://example.com/path?q=1 ").unwrap();
        assert_eq!(request.url().as_str(), "https://example.com/path?q=1");
    }

    #[test]
    fn test_request_rejects_bad_input() {
        assert_eq!(ScrapeRequest::new(""), Err(RequestError::MissingUrl));
        assert_eq!(
            ScrapeRequest::new("ftp://example.com/file"),
            Err(RequestError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            ScrapeRequest::new("example.com"),
            Err(RequestError::InvalidUrl(_))
        ));
        assert!(matches!(
            ScrapeRequest::new("javascript:alert(1)"),
            Err(RequestError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_interaction_log_starts_with_initial_page() {
        let url = Url::parse("https://example.com/").unwrap();
        let mut log = InteractionLog::starting_at(&url);
        log.record_click("Tab: [role=\"tab\"] (index 0)");
        log.record_scroll();
        log.record_page("https://example.com/?page=2");

        assert_eq!(log.pages(), ["https://example.com/", "https://example.com/?page=2"]);
        assert_eq!(log.clicks().len(), 1);
        assert_eq!(log.scrolls(), 1);
    }

    #[test]
    fn test_result_json_field_names() {
        let url = Url::parse("https://example.com/").unwrap();
        let result = ScrapeResult {
            url: url.to_string(),
            scraped_at: Utc::now(),
            meta: Metadata {
                title: Some("Example".to_string()),
                ..Metadata::default()
            },
            interactions: InteractionLog::starting_at(&url),
            sections: vec![Section {
                id: "nav-0".to_string(),
                kind: SectionType::Nav,
                label: "Main menu".to_string(),
                source_url: url.to_string(),
                content: ContentBlock::default(),
                raw_html: "<nav></nav>".to_string(),
                truncated: false,
            }],
            errors: vec![ErrorRecord {
                phase: Phase::Fetch,
                message: "HTTP error: 403".to_string(),
            }],
        };

        let json = serde_json::to_value(ScrapeResponse { result }).unwrap();
        let result = &json["result"];
        assert!(result["scrapedAt"].is_string());
        assert_eq!(result["meta"]["title"], "Example");
        assert!(result["meta"]["canonical"].is_null());
        assert_eq!(result["interactions"]["scrolls"], 0);
        assert_eq!(result["interactions"]["pages"][0], "https://example.com/");
        assert_eq!(result["sections"][0]["type"], "nav");
        assert_eq!(result["sections"][0]["rawHtml"], "<nav></nav>");
        assert_eq!(result["sections"][0]["sourceUrl"], "https://example.com/");
        assert!(result["sections"][0]["content"]["tables"].is_array());
        assert_eq!(result["errors"][0]["phase"], "fetch");
    }
}
