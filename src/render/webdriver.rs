use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};

use super::{ElementHandle, Matcher, RenderEngine, RenderSession};
use crate::config::{ScraperConfig, TimeoutConfig};
use crate::error::RenderError;

/// WebDriver endpoints tried when the configured one refuses a session
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

const NETWORK_SNAPSHOT_SCRIPT: &str =
    "return [performance.getEntriesByType('resource').length, document.readyState];";
const SCROLL_HEIGHT_SCRIPT: &str = "return Math.max(\
     document.body ? document.body.scrollHeight : 0, \
     document.documentElement ? document.documentElement.scrollHeight : 0);";
const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, Math.max(\
     document.body ? document.body.scrollHeight : 0, \
     document.documentElement ? document.documentElement.scrollHeight : 0)); return null;";

/// Opens sessions on a WebDriver server (ChromeDriver, geckodriver, Selenium)
#[derive(Debug, Clone)]
pub struct WebDriverEngine {
    webdriver_url: String,
    headless: bool,
    timeouts: TimeoutConfig,
    poll_interval: Duration,
}

impl WebDriverEngine {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            timeouts: config.timeouts,
            poll_interval: Duration::from_millis(config.interaction.poll_interval_ms.max(10)),
        }
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::new();
        if self.headless {
            capabilities.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox", "--window-size=1366,900"] }),
            );
            capabilities.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        capabilities
    }

    /// Connects to the configured WebDriver, then to well-known local ports
    async fn connect(&self) -> Result<Client, RenderError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());

        let first_error = match builder.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(client);
            }
            Err(e) => {
                ::log::warn!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                e.to_string()
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS {
            if *url == self.webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = builder.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(client);
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(RenderError::Connect(first_error))
    }
}

#[async_trait]
impl RenderEngine for WebDriverEngine {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let client = self.connect().await?;

        // Our own deadlines are the real bounds; these keep the browser from
        // blocking the session far beyond them.
        let browser_timeouts = TimeoutConfiguration::new(
            Some(self.timeouts.interaction()),
            Some(self.timeouts.page_load()),
            Some(Duration::ZERO),
        );
        if let Err(e) = client.update_timeouts(browser_timeouts).await {
            ::log::warn!("Could not set WebDriver timeouts: {}", e);
        }

        Ok(Box::new(WebDriverSession {
            client: Some(client),
            elements: Vec::new(),
            timeouts: self.timeouts,
            poll_interval: self.poll_interval,
        }))
    }
}

/// A browser tab driven over WebDriver
pub struct WebDriverSession {
    client: Option<Client>,
    elements: Vec<Element>,
    timeouts: TimeoutConfig,
    poll_interval: Duration,
}

impl WebDriverSession {
    fn client(&self) -> Result<&Client, RenderError> {
        self.client
            .as_ref()
            .ok_or_else(|| RenderError::Command("session already closed".to_string()))
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element, RenderError> {
        self.elements
            .get(handle.0)
            .ok_or(RenderError::StaleHandle(handle.0))
    }

    async fn execute(&self, script: &str, limit: Duration) -> Result<Value, RenderError> {
        let client = self.client()?;
        bounded(limit, "Script", client.execute(script, Vec::new())).await
    }

    /// Number of resource entries so far and whether the document finished loading
    async fn network_snapshot(&self, limit: Duration) -> Result<(u64, bool), RenderError> {
        let value = self.execute(NETWORK_SNAPSHOT_SCRIPT, limit).await?;
        let count = value.get(0).and_then(Value::as_u64).ok_or_else(|| {
            RenderError::Script(format!("unexpected network snapshot {value}"))
        })?;
        let complete = value.get(1).and_then(Value::as_str) == Some("complete");
        Ok((count, complete))
    }
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn load(&mut self, url: &str) -> Result<(), RenderError> {
        let deadline = self.timeouts.page_load();
        let started = Instant::now();
        self.elements.clear();

        let client = self.client()?;
        match tokio::time::timeout(deadline, client.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(RenderError::Navigation(e.to_string())),
            Err(_) => return Err(page_load_timeout(deadline)),
        }

        let remaining = deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(page_load_timeout(deadline));
        }
        self.wait_for_network_idle(remaining).await
    }

    async fn query(&mut self, matcher: &Matcher) -> Result<Vec<ElementHandle>, RenderError> {
        let limit = self.timeouts.interaction();
        let client = self.client()?;
        let found = match matcher {
            Matcher::Css(css) => bounded(limit, "Query", client.find_all(Locator::Css(css))).await?,
            Matcher::Text { tag, text } => {
                let xpath = text_xpath(tag, text);
                bounded(limit, "Query", client.find_all(Locator::XPath(&xpath))).await?
            }
        };

        let first = self.elements.len();
        self.elements.extend(found);
        Ok((first..self.elements.len()).map(ElementHandle).collect())
    }

    async fn is_visible(&mut self, element: ElementHandle) -> Result<bool, RenderError> {
        let limit = self.timeouts.interaction();
        let element = self.element(element)?;
        bounded(limit, "Visibility check", element.is_displayed()).await
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), RenderError> {
        let limit = self.timeouts.interaction();
        let element = self.element(element)?;
        bounded(limit, "Click", element.click()).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        self.execute(SCROLL_TO_BOTTOM_SCRIPT, self.timeouts.interaction())
            .await
            .map(|_| ())
    }

    async fn scroll_height(&mut self) -> Result<u64, RenderError> {
        let value = self
            .execute(SCROLL_HEIGHT_SCRIPT, self.timeouts.interaction())
            .await?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|height| height.max(0.0) as u64))
            .ok_or_else(|| RenderError::Script(format!("unexpected scroll height {value}")))
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), RenderError> {
        let idle_window = self.timeouts.network_idle();
        let started = Instant::now();
        let mut last_count = None;
        let mut quiet_since = Instant::now();

        loop {
            let remaining = timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(RenderError::Timeout {
                    what: "Network idle",
                    after_ms: millis(timeout),
                });
            }

            let limit = remaining.min(self.timeouts.interaction());
            let (count, complete) = self.network_snapshot(limit).await?;
            if !complete || last_count != Some(count) {
                last_count = Some(count);
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= idle_window {
                return Ok(());
            }

            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    async fn current_url(&mut self) -> Result<String, RenderError> {
        let limit = self.timeouts.interaction();
        let client = self.client()?;
        bounded(limit, "Current URL", client.current_url())
            .await
            .map(|url| url.to_string())
    }

    async fn current_markup(&mut self) -> Result<String, RenderError> {
        let limit = self.timeouts.page_load();
        let client = self.client()?;
        bounded(limit, "Page source", client.source()).await
    }

    async fn close(mut self: Box<Self>) -> Result<(), RenderError> {
        self.elements.clear();
        match self.client.take() {
            Some(client) => client.close().await.map_err(RenderError::from),
            None => Ok(()),
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        // Dropped without close(): the request was cancelled mid-flight
        let Some(client) = self.client.take() else {
            return;
        };
        self.elements.clear();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.close().await {
                        ::log::warn!("Failed to close abandoned WebDriver session: {}", e);
                    }
                });
            }
            Err(_) => ::log::warn!("WebDriver session dropped outside a runtime; not closed"),
        }
    }
}

/// Run one WebDriver command under a deadline
async fn bounded<T>(
    limit: Duration,
    what: &'static str,
    command: impl Future<Output = Result<T, CmdError>>,
) -> Result<T, RenderError> {
    match tokio::time::timeout(limit, command).await {
        Ok(result) => result.map_err(RenderError::from),
        Err(_) => Err(RenderError::Timeout {
            what,
            after_ms: millis(limit),
        }),
    }
}

/// XPath for `tag` elements whose normalized text contains `text`, case-insensitively
fn text_xpath(tag: &str, text: &str) -> String {
    const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
    format!(
        "//{tag}[contains(translate(normalize-space(.), '{UPPER}', '{LOWER}'), '{}')]",
        text.to_lowercase().replace('\'', "")
    )
}

fn page_load_timeout(deadline: Duration) -> RenderError {
    RenderError::Timeout {
        what: "Page load",
        after_ms: millis(deadline),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
