use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a scraper instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Thresholds deciding whether a page needs a browser
    #[serde(default)]
    pub fallback: FallbackThresholds,

    /// Bounds on every wait the pipeline performs
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Depths and settle delays for the interaction routines
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Sections with less extracted text than this are dropped
    #[serde(default = "default_min_section_text")]
    pub min_section_text: usize,

    /// Maximum characters of raw HTML kept per section
    #[serde(default = "default_raw_html_limit")]
    pub raw_html_limit: usize,

    /// Text a top-level container needs when a page has no landmarks
    #[serde(default = "default_fallback_container_text")]
    pub fallback_container_text: usize,

    /// Regex patterns for hrefs that are never reported as links
    #[serde(default = "default_exclude_link_patterns")]
    pub exclude_link_patterns: Vec<String>,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Ask the browser to run without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User agent sent with the static request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Text-length thresholds for the static-vs-render decision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FallbackThresholds {
    /// Below this many characters the page is treated as empty
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Framework pages with more text than this are treated as server-rendered
    #[serde(default = "default_ssr_text_length")]
    pub ssr_text_length: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_fetch_secs")]
    pub fetch_secs: u64,

    /// Navigation plus network-idle wait, and waits after pagination clicks
    #[serde(default = "default_page_load_secs")]
    pub page_load_secs: u64,

    /// Each click, query and scroll wait
    #[serde(default = "default_interaction_secs")]
    pub interaction_secs: u64,

    /// How long the network must stay quiet to count as idle
    #[serde(default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Ceiling for one whole request
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Repetitions allowed per load-more selector, scroll loop and pagination
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_tab_clicks_per_selector")]
    pub tab_clicks_per_selector: usize,

    #[serde(default = "default_tab_settle_ms")]
    pub tab_settle_ms: u64,

    #[serde(default = "default_load_more_settle_ms")]
    pub load_more_settle_ms: u64,

    /// Delay before the first scroll height measurement
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Interval between polls while waiting on the page
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_min_section_text() -> usize {
    10
}

fn default_raw_html_limit() -> usize {
    500
}

fn default_fallback_container_text() -> usize {
    50
}

fn default_exclude_link_patterns() -> Vec<String> {
    vec![r"(?i)^\s*javascript:".to_string()]
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_min_text_length() -> usize {
    100
}

fn default_ssr_text_length() -> usize {
    500
}

fn default_fetch_secs() -> u64 {
    10
}

fn default_page_load_secs() -> u64 {
    30
}

fn default_interaction_secs() -> u64 {
    5
}

fn default_network_idle_ms() -> u64 {
    500
}

fn default_request_secs() -> u64 {
    120
}

fn default_max_depth() -> usize {
    3
}

fn default_tab_clicks_per_selector() -> usize {
    3
}

fn default_tab_settle_ms() -> u64 {
    500
}

fn default_load_more_settle_ms() -> u64 {
    1000
}

fn default_scroll_settle_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for FallbackThresholds {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            ssr_text_length: default_ssr_text_length(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_secs: default_fetch_secs(),
            page_load_secs: default_page_load_secs(),
            interaction_secs: default_interaction_secs(),
            network_idle_ms: default_network_idle_ms(),
            request_secs: default_request_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }

    pub fn interaction(&self) -> Duration {
        Duration::from_secs(self.interaction_secs)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            tab_clicks_per_selector: default_tab_clicks_per_selector(),
            tab_settle_ms: default_tab_settle_ms(),
            load_more_settle_ms: default_load_more_settle_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackThresholds::default(),
            timeouts: TimeoutConfig::default(),
            interaction: InteractionConfig::default(),
            min_section_text: default_min_section_text(),
            raw_html_limit: default_raw_html_limit(),
            fallback_container_text: default_fallback_container_text(),
            exclude_link_patterns: default_exclude_link_patterns(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }

    /// Override the WebDriver URL with the WEBDRIVER_URL environment variable if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = ScraperConfig::default();
        assert_eq!(config.fallback.min_text_length, 100);
        assert_eq!(config.fallback.ssr_text_length, 500);
        assert_eq!(config.timeouts.fetch(), Duration::from_secs(10));
        assert_eq!(config.timeouts.page_load(), Duration::from_secs(30));
        assert_eq!(config.timeouts.interaction(), Duration::from_secs(5));
        assert_eq!(config.timeouts.network_idle(), Duration::from_millis(500));
        assert_eq!(config.timeouts.request(), Duration::from_secs(120));
        assert_eq!(config.interaction.max_depth, 3);
        assert_eq!(config.raw_html_limit, 500);
        assert_eq!(config.min_section_text, 10);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = ScraperConfig::from_json(
            r#"{"fallback": {"ssr_text_length": 800}, "webdriver_url": "http://localhost:9515"}"#,
        )
        .unwrap();

        assert_eq!(config.fallback.ssr_text_length, 800);
        assert_eq!(config.fallback.min_text_length, 100);
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert_eq!(config.interaction.tab_settle_ms, 500);
        assert_eq!(config.exclude_link_patterns.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ScraperConfig::from_json("{not json").is_err());
    }
}
