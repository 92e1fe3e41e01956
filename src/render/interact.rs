use std::time::Duration;

use tokio::time::{Instant, sleep};

use super::{ElementHandle, Matcher, RenderSession};
use crate::config::{InteractionConfig, ScraperConfig, TimeoutConfig};
use crate::error::RenderError;
use crate::results::InteractionLog;

const TAB_MATCHERS: &[Matcher] = &[
    Matcher::Css("[role=\"tab\"]"),
    Matcher::Css(".tab:not(.active)"),
    Matcher::Css("[data-tab]"),
    Matcher::Css("button[aria-selected=\"false\"]"),
];

const LOAD_MORE_MATCHERS: &[Matcher] = &[
    Matcher::Text {
        tag: "button",
        text: "Load more",
    },
    Matcher::Text {
        tag: "button",
        text: "Show more",
    },
    Matcher::Text {
        tag: "a",
        text: "Load more",
    },
    Matcher::Text {
        tag: "a",
        text: "Show more",
    },
    Matcher::Css("[class*=\"load-more\"]"),
    Matcher::Css("[class*=\"show-more\"]"),
];

const PAGINATION_MATCHERS: &[Matcher] = &[
    Matcher::Css("a[aria-label*=\"Next\"]"),
    Matcher::Text {
        tag: "a",
        text: "Next",
    },
    Matcher::Text {
        tag: "a",
        text: "→",
    },
    Matcher::Css("[class*=\"next\"]"),
    Matcher::Css("[rel=\"next\"]"),
];

/// Drives a rendered page to reveal content hidden behind common UI patterns
#[derive(Debug, Clone)]
pub struct InteractionAutomator {
    config: InteractionConfig,
    timeouts: TimeoutConfig,
}

impl InteractionAutomator {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            config: config.interaction,
            timeouts: config.timeouts,
        }
    }

    /// Run tabs, load-more, infinite scroll and pagination, in that order
    ///
    /// A failing routine only ends itself; the next one still runs.
    pub async fn run(&self, session: &mut dyn RenderSession, log: &mut InteractionLog) {
        let tabs = self.click_tabs(session, log).await;
        ::log::info!("Clicked {} tabs", tabs);

        let loads = self.click_load_more(session, log).await;
        ::log::info!("Clicked load-more {} times", loads);

        match self.infinite_scroll(session, log).await {
            Ok(scrolls) => ::log::info!("Infinite scroll grew the page {} times", scrolls),
            Err(e) => ::log::debug!("Infinite scroll stopped: {}", e),
        }

        let pages = self.follow_pagination(session, log).await;
        ::log::info!("Followed {} pagination links", pages);
    }

    /// Click up to `tab_clicks_per_selector` matches of every tab selector
    pub async fn click_tabs(
        &self,
        session: &mut dyn RenderSession,
        log: &mut InteractionLog,
    ) -> usize {
        let mut clicked = 0;

        for matcher in TAB_MATCHERS {
            let tabs = match session.query(matcher).await {
                Ok(tabs) => tabs,
                Err(e) => {
                    ::log::debug!("Tab query {} failed: {}", matcher, e);
                    continue;
                }
            };

            for (index, tab) in tabs
                .into_iter()
                .take(self.config.tab_clicks_per_selector)
                .enumerate()
            {
                if let Err(e) = session.click(tab).await {
                    ::log::debug!("Tab {} (index {}) not clickable: {}", matcher, index, e);
                    continue;
                }
                log.record_click(format!("Tab: {} (index {})", matcher, index));
                clicked += 1;
                sleep(Duration::from_millis(self.config.tab_settle_ms)).await;
            }
        }

        clicked
    }

    /// Click each load-more control repeatedly until it disappears or depth runs out
    pub async fn click_load_more(
        &self,
        session: &mut dyn RenderSession,
        log: &mut InteractionLog,
    ) -> usize {
        let mut clicked = 0;

        for matcher in LOAD_MORE_MATCHERS {
            for _ in 0..self.config.max_depth {
                match self.click_first_visible(session, matcher).await {
                    Ok(true) => {
                        log.record_click(format!("Load More: {}", matcher));
                        clicked += 1;
                        sleep(Duration::from_millis(self.config.load_more_settle_ms)).await;
                    }
                    Ok(false) => break,
                    Err(e) => {
                        ::log::debug!("Load more {} failed: {}", matcher, e);
                        break;
                    }
                }
            }
        }

        clicked
    }

    /// Scroll to the bottom while that keeps growing the page
    pub async fn infinite_scroll(
        &self,
        session: &mut dyn RenderSession,
        log: &mut InteractionLog,
    ) -> Result<u32, RenderError> {
        let mut grown = 0;
        sleep(Duration::from_millis(self.config.scroll_settle_ms)).await;

        for _ in 0..self.config.max_depth {
            let before = session.scroll_height().await?;
            session.scroll_to_bottom().await?;

            if !self.wait_for_growth(session, before).await? {
                ::log::debug!("Scroll height stayed at {}", before);
                break;
            }
            log.record_scroll();
            grown += 1;
        }

        Ok(grown)
    }

    /// Follow next-page links, visiting at most `max_depth` further pages
    pub async fn follow_pagination(
        &self,
        session: &mut dyn RenderSession,
        log: &mut InteractionLog,
    ) -> usize {
        let mut followed = 0;

        for _ in 0..self.config.max_depth {
            let Some((matcher, link)) = self.find_next_link(session).await else {
                break;
            };

            match self.navigate(session, link).await {
                Ok(url) => {
                    ::log::debug!("Paginated via {} to {}", matcher, url);
                    log.record_page(url);
                    followed += 1;
                }
                Err(e) => {
                    ::log::debug!("Pagination via {} failed: {}", matcher, e);
                    break;
                }
            }
        }

        followed
    }

    async fn find_next_link(
        &self,
        session: &mut dyn RenderSession,
    ) -> Option<(&'static Matcher, ElementHandle)> {
        for matcher in PAGINATION_MATCHERS {
            match first_visible(session, matcher).await {
                Ok(Some(link)) => return Some((matcher, link)),
                Ok(None) => {}
                Err(e) => ::log::debug!("Pagination query {} failed: {}", matcher, e),
            }
        }
        None
    }

    async fn navigate(
        &self,
        session: &mut dyn RenderSession,
        link: ElementHandle,
    ) -> Result<String, RenderError> {
        session.click(link).await?;
        session
            .wait_for_network_idle(self.timeouts.page_load())
            .await?;
        session.current_url().await
    }

    async fn click_first_visible(
        &self,
        session: &mut dyn RenderSession,
        matcher: &Matcher,
    ) -> Result<bool, RenderError> {
        match first_visible(session, matcher).await? {
            Some(element) => {
                session.click(element).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Poll until the scroll height exceeds `before`, within the interaction timeout
    async fn wait_for_growth(
        &self,
        session: &mut dyn RenderSession,
        before: u64,
    ) -> Result<bool, RenderError> {
        let deadline = Instant::now() + self.timeouts.interaction();
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));

        loop {
            if session.scroll_height().await? > before {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(poll).await;
        }
    }
}

async fn first_visible(
    session: &mut dyn RenderSession,
    matcher: &Matcher,
) -> Result<Option<ElementHandle>, RenderError> {
    for element in session.query(matcher).await? {
        if session.is_visible(element).await? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}
