pub mod meta;
pub mod signal;
pub mod text;

#[cfg(test)]
mod tests;

use crate::config::ScraperConfig;
use crate::error::ParseError;
use crate::filter::UrlFilter;
use crate::results::{Metadata, Section};
use crate::sections;
use scraper::{ElementRef, Html, Selector};
use signal::ContentSignal;
use std::sync::LazyLock;
use url::Url;

static BASE: LazyLock<Selector> = LazyLock::new(|| selector("base[href]"));

/// One parsed HTML document at one point in time
///
/// Trees are never mutated; re-parsing the current markup produces a new one.
pub struct ContentTree {
    document: Html,
    url: Url,
}

impl ContentTree {
    /// Parse a full HTML document fetched from `url`
    pub fn parse(markup: &str, url: &Url) -> Result<Self, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let document = Html::parse_document(markup);
        if !document.errors.is_empty() {
            ::log::trace!(
                "html5ever recovered from {} markup errors in {}",
                document.errors.len(),
                url
            );
        }

        Ok(Self {
            document,
            url: url.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// All elements matching `selector` in document order
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> {
        self.document.select(selector)
    }

    /// URL relative references resolve against: `<base href>` when present, else the page URL
    pub fn base_url(&self) -> Url {
        self.first(&BASE)
            .and_then(|base| base.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| self.url.join(href).ok())
            .unwrap_or_else(|| self.url.clone())
    }

    /// The first element matching `selector`
    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }
}

/// Everything the pipeline keeps from one parsed document
#[derive(Debug, Clone)]
pub struct PageExtract {
    pub meta: Metadata,
    pub sections: Vec<Section>,
    pub signal: ContentSignal,
}

/// Parse markup and pull metadata, sections and the content signal out of it
///
/// The tree only lives for the duration of this call, so the returned data
/// can be carried across await points.
pub fn extract_page(
    markup: &str,
    url: &Url,
    filter: &UrlFilter,
    config: &ScraperConfig,
) -> Result<PageExtract, ParseError> {
    let tree = ContentTree::parse(markup, url)?;

    let base_url = tree.base_url();
    let rebased;
    let filter = if &base_url == filter.base_url() {
        filter
    } else {
        ::log::debug!("Resolving links in {} against <base> {}", url, base_url);
        rebased = filter.clone().with_base(base_url);
        &rebased
    };

    let meta = meta::extract_metadata(&tree);
    let sections = sections::detect_sections(&tree, filter, config);
    let signal = ContentSignal::measure(&tree, &sections);

    ::log::debug!(
        "Extracted {} sections ({} chars) from {}",
        sections.len(),
        signal.text_length,
        url
    );

    Ok(PageExtract {
        meta,
        sections,
        signal,
    })
}

/// Compile a selector written in this crate
pub(crate) fn selector(css: &'static str) -> Selector {
    match Selector::parse(css) {
        Ok(selector) => selector,
        Err(e) => panic!("invalid built-in selector {css:?}: {e}"),
    }
}
