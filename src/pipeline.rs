use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ParseError;
use crate::fallback::signal_needs_rendering;
use crate::fetch::StaticFetcher;
use crate::filter::{UrlFilter, compile_patterns};
use crate::parsers::{PageExtract, extract_page};
use crate::render::interact::InteractionAutomator;
use crate::render::webdriver::WebDriverEngine;
use crate::render::{RenderEngine, RenderSession};
use crate::report::{ErrorLog, ResultAssembler};
use crate::results::{InteractionLog, Phase, ScrapeRequest, ScrapeResult};

/// Runs scrape requests: static fetch, optional browser render, extraction
pub struct Scraper {
    config: ScraperConfig,
    fetcher: StaticFetcher,
    engine: Arc<dyn RenderEngine>,
    automator: InteractionAutomator,
    exclude_regexes: Vec<Regex>,
}

impl Scraper {
    /// Create a scraper that renders through the configured WebDriver server
    pub fn new(config: ScraperConfig) -> Result<Self, regex::Error> {
        let engine = Arc::new(WebDriverEngine::new(&config));
        Self::with_engine(config, engine)
    }

    /// Create a scraper with a custom render engine
    pub fn with_engine(
        config: ScraperConfig,
        engine: Arc<dyn RenderEngine>,
    ) -> Result<Self, regex::Error> {
        let exclude_regexes = compile_patterns(&config.exclude_link_patterns)?;
        Ok(Self {
            fetcher: StaticFetcher::new(&config),
            automator: InteractionAutomator::new(&config),
            engine,
            exclude_regexes,
            config,
        })
    }

    /// Load configuration from a JSON file, then apply environment overrides
    pub fn with_config_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let config = ScraperConfig::from_file(path)?.with_env_overrides();
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape one page
    ///
    /// Never fails: every problem ends up in the result's `errors`. When the
    /// request ceiling is hit, whatever was gathered so far is returned.
    pub async fn scrape(&self, request: &ScrapeRequest) -> ScrapeResult {
        let url = request.url();
        let ceiling = self.config.timeouts.request();
        let mut progress = Progress::new(url);

        ::log::info!("Scraping {}", url);
        if tokio::time::timeout(ceiling, self.run(url, &mut progress))
            .await
            .is_err()
        {
            let phase = progress.phase;
            progress.errors.record(
                phase,
                format!("Total scrape timeout after {} seconds", ceiling.as_secs()),
            );
        }

        progress.close_session(&self.config).await;
        progress.assemble(url)
    }

    async fn run(&self, url: &Url, progress: &mut Progress) {
        progress.enter(Phase::Fetch);
        let needs_render = match self.fetcher.fetch(url).await {
            Ok(fetched) => {
                progress.enter(Phase::Parse);
                match self.extract(&fetched.body, &fetched.url) {
                    Ok(page) => {
                        let render = signal_needs_rendering(&page.signal, &self.config.fallback);
                        ::log::info!(
                            "Static text length {} (framework: {}), render needed: {}",
                            page.signal.text_length,
                            page.signal.framework.as_deref().unwrap_or("none"),
                            render
                        );
                        progress.static_page = Some(page);
                        render
                    }
                    Err(e) => {
                        progress.errors.parse(e);
                        true
                    }
                }
            }
            Err(e) => {
                progress.errors.fetch(e);
                true
            }
        };

        if needs_render {
            self.render(url, progress).await;
        }
    }

    async fn render(&self, url: &Url, progress: &mut Progress) {
        progress.enter(Phase::Render);
        let session = match self.engine.open().await {
            Ok(session) => progress.session.insert(session),
            Err(e) => {
                progress.errors.render(e);
                return;
            }
        };

        // A timed-out load still leaves a partially rendered page to work with
        let load_timed_out = match session.load(url.as_str()).await {
            Ok(()) => false,
            Err(e) if e.is_timeout() => {
                ::log::warn!("Continuing with partially loaded {}: {}", url, e);
                progress.errors.render(e);
                true
            }
            Err(e) => {
                progress.errors.render(e);
                return;
            }
        };

        self.automator
            .run(session.as_mut(), &mut progress.interactions)
            .await;

        let markup = match session.current_markup().await {
            Ok(markup) => markup,
            Err(e) if load_timed_out => {
                ::log::debug!("No markup after load timeout: {}", e);
                return;
            }
            Err(e) => {
                progress.errors.render(e);
                return;
            }
        };
        let page_url = self.rendered_url(session.as_mut(), url).await;

        progress.enter(Phase::Parse);
        match self.extract(&markup, &page_url) {
            Ok(page) => progress.rendered_page = Some(page),
            // The load error already covers a page that never produced a document
            Err(ParseError::EmptyDocument) if load_timed_out => {
                ::log::debug!("Blank document after load timeout on {}", page_url);
            }
            Err(e) => progress.errors.parse(e),
        }
    }

    /// The URL the session ended on, which differs from `url` after pagination
    async fn rendered_url(&self, session: &mut dyn RenderSession, url: &Url) -> Url {
        match session.current_url().await {
            Ok(current) => Url::parse(&current).unwrap_or_else(|_| url.clone()),
            Err(e) => {
                ::log::debug!("Could not read the rendered URL: {}", e);
                url.clone()
            }
        }
    }

    fn extract(&self, markup: &str, url: &Url) -> Result<PageExtract, ParseError> {
        let filter = UrlFilter::with_regexes(url.clone(), self.exclude_regexes.clone());
        extract_page(markup, url, &filter, &self.config)
    }
}

/// Per-request state that outlives the timed part of the pipeline
struct Progress {
    phase: Phase,
    errors: ErrorLog,
    static_page: Option<PageExtract>,
    rendered_page: Option<PageExtract>,
    interactions: InteractionLog,
    session: Option<Box<dyn RenderSession>>,
}

impl Progress {
    fn new(url: &Url) -> Self {
        Self {
            phase: Phase::Fetch,
            errors: ErrorLog::new(),
            static_page: None,
            rendered_page: None,
            interactions: InteractionLog::starting_at(url),
            session: None,
        }
    }

    fn enter(&mut self, phase: Phase) {
        ::log::debug!("Entering {:?} phase", phase);
        self.phase = phase;
    }

    async fn close_session(&mut self, config: &ScraperConfig) {
        let Some(session) = self.session.take() else {
            return;
        };

        match tokio::time::timeout(config.timeouts.interaction(), session.close()).await {
            Ok(Ok(())) => ::log::debug!("Browser session closed"),
            Ok(Err(e)) => ::log::warn!("Failed to close browser session: {}", e),
            Err(_) => ::log::warn!("Timed out closing browser session"),
        }
    }

    /// Rendered sections win when there are any; static ones are the fallback
    fn assemble(self, url: &Url) -> ScrapeResult {
        let Progress {
            errors,
            static_page,
            rendered_page,
            interactions,
            ..
        } = self;

        let (rendered_meta, rendered_sections) = match rendered_page {
            Some(page) => (Some(page.meta), page.sections),
            None => (None, Vec::new()),
        };
        let (static_meta, static_sections) = match static_page {
            Some(page) => (Some(page.meta), page.sections),
            None => (None, Vec::new()),
        };

        let sections = if rendered_sections.is_empty() {
            static_sections
        } else {
            rendered_sections
        };
        let meta = rendered_meta.or(static_meta).unwrap_or_default();

        ::log::info!(
            "Scraped {} with {} sections and {} errors",
            url,
            sections.len(),
            errors.records().len()
        );

        ResultAssembler::new(url)
            .meta(meta)
            .interactions(interactions)
            .sections(sections)
            .errors(errors)
            .finish()
    }
}
