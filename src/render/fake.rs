//! Scripted in-memory render engine for tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ElementHandle, Matcher, RenderEngine, RenderSession};
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    Timeout,
    Navigation,
}

/// One element the fake page exposes to a matcher
#[derive(Debug, Clone)]
pub struct FakeElement {
    /// The first entry names the element in click logs
    matchers: Vec<Matcher>,
    visible: bool,
    clicks_until_hidden: Option<usize>,
    navigation: Option<VecDeque<String>>,
}

impl FakeElement {
    pub fn new(matcher: Matcher) -> Self {
        Self {
            matchers: vec![matcher],
            visible: true,
            clicks_until_hidden: None,
            navigation: None,
        }
    }

    /// Make the element show up under another matcher as well
    pub fn also_matches(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn hides_after(mut self, clicks: usize) -> Self {
        self.clicks_until_hidden = Some(clicks);
        self
    }

    /// Each click navigates to the next URL; the element hides once they run out
    pub fn navigates_to(mut self, urls: Vec<String>) -> Self {
        self.navigation = Some(urls.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    pub markup: String,
    pub elements: Vec<FakeElement>,
    /// Height reported after each scroll; the last value repeats
    pub scroll_heights: Vec<u64>,
    pub open_fails: bool,
    pub load_failure: Option<LoadFailure>,
    pub idle_fails: bool,
    /// Delay before `load` returns
    pub load_delay: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeStats {
    pub opened: usize,
    pub closed: usize,
    /// Sessions dropped without `close`
    pub closed_on_drop: usize,
    pub loads: Vec<String>,
    pub clicks: Vec<String>,
    pub scroll_attempts: usize,
    /// When the page height was first measured
    pub first_height_at: Option<Instant>,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    script: FakeScript,
    stats: Arc<Mutex<FakeStats>>,
}

impl FakeEngine {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script,
            stats: Arc::default(),
        }
    }

    pub fn stats(&self) -> FakeStats {
        self.stats.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        if self.script.open_fails {
            return Err(RenderError::Connect("no browser available".to_string()));
        }
        self.stats.lock().unwrap().opened += 1;
        Ok(Box::new(FakeSession {
            script: self.script.clone(),
            url: String::new(),
            scroll_step: 0,
            stats: Arc::clone(&self.stats),
            closed: false,
        }))
    }
}

pub struct FakeSession {
    script: FakeScript,
    url: String,
    scroll_step: usize,
    stats: Arc<Mutex<FakeStats>>,
    closed: bool,
}

impl FakeSession {
    fn element(&mut self, handle: ElementHandle) -> Result<&mut FakeElement, RenderError> {
        self.script
            .elements
            .get_mut(handle.0)
            .ok_or(RenderError::StaleHandle(handle.0))
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn load(&mut self, url: &str) -> Result<(), RenderError> {
        self.stats.lock().unwrap().loads.push(url.to_string());
        if let Some(delay) = self.script.load_delay {
            tokio::time::sleep(delay).await;
        }
        match self.script.load_failure {
            Some(LoadFailure::Timeout) => {
                // The browser stays on the page it was still loading
                self.url = url.to_string();
                Err(RenderError::Timeout {
                    what: "Page load",
                    after_ms: 30_000,
                })
            }
            Some(LoadFailure::Navigation) => {
                Err(RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()))
            }
            None => {
                self.url = url.to_string();
                Ok(())
            }
        }
    }

    async fn query(&mut self, matcher: &Matcher) -> Result<Vec<ElementHandle>, RenderError> {
        Ok(self
            .script
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.matchers.contains(matcher))
            .map(|(index, _)| ElementHandle(index))
            .collect())
    }

    async fn is_visible(&mut self, element: ElementHandle) -> Result<bool, RenderError> {
        Ok(self.element(element)?.visible)
    }

    async fn click(&mut self, handle: ElementHandle) -> Result<(), RenderError> {
        let element = self.element(handle)?;
        if !element.visible {
            return Err(RenderError::Command("element not interactable".to_string()));
        }

        let description = element.matchers[0].to_string();
        if let Some(remaining) = element.clicks_until_hidden.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                element.visible = false;
            }
        }

        let mut destination = None;
        if let Some(urls) = element.navigation.as_mut() {
            destination = urls.pop_front();
            if urls.is_empty() {
                element.visible = false;
            }
        }

        if let Some(url) = destination {
            self.url = url;
        }
        self.stats.lock().unwrap().clicks.push(description);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        self.scroll_step += 1;
        self.stats.lock().unwrap().scroll_attempts += 1;
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64, RenderError> {
        self.stats
            .lock()
            .unwrap()
            .first_height_at
            .get_or_insert_with(Instant::now);
        let heights = &self.script.scroll_heights;
        Ok(heights
            .get(self.scroll_step)
            .or(heights.last())
            .copied()
            .unwrap_or(800))
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), RenderError> {
        if self.script.idle_fails {
            return Err(RenderError::Timeout {
                what: "Network idle",
                after_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, RenderError> {
        Ok(self.url.clone())
    }

    async fn current_markup(&mut self) -> Result<String, RenderError> {
        Ok(self.script.markup.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let mut session = self;
        session.closed = true;
        session.stats.lock().unwrap().closed += 1;
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.closed {
            if let Ok(mut stats) = self.stats.lock() {
                stats.closed_on_drop += 1;
            }
        }
    }
}
