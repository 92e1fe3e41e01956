use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Resolves hrefs found in a page and decides which ones are reported
#[derive(Debug, Clone)]
pub struct UrlFilter {
    page_url: Url,
    /// What relative references resolve against; the page URL unless `<base href>` says otherwise
    base_url: Url,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a filter for links found on `page_url`
    pub fn new(page_url: Url, exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        Ok(Self::with_regexes(
            page_url,
            compile_patterns(exclude_patterns)?,
        ))
    }

    /// Create a filter from already compiled exclusion patterns
    pub fn with_regexes(page_url: Url, exclude_regexes: Vec<Regex>) -> Self {
        Self {
            base_url: page_url.clone(),
            page_url,
            exclude_regexes,
        }
    }

    /// Resolve relative references against `base_url` instead of the page URL
    pub fn with_base(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a raw href or src against the page URL
    ///
    /// Returns `None` for empty values, excluded patterns, anchor-only
    /// references back into the page, and anything that does not resolve.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            return None;
        }

        for regex in &self.exclude_regexes {
            if regex.is_match(raw) {
                return None;
            }
        }

        // Protocol-relative references take the page scheme
        let resolved = if let Some(rest) = raw.strip_prefix("//") {
            Url::parse(&format!("{}://{}", self.base_url.scheme(), rest)).ok()?
        } else {
            self.base_url.join(raw).ok()?
        };

        if self.is_anchor_only(&resolved) {
            return None;
        }

        Some(resolved.to_string())
    }

    /// A URL that only adds a fragment to the page itself
    fn is_anchor_only(&self, url: &Url) -> bool {
        if url.fragment().is_none() {
            return false;
        }
        let mut without_fragment = url.clone();
        without_fragment.set_fragment(None);
        let mut page = self.page_url.clone();
        page.set_fragment(None);
        without_fragment == page
    }

    /// Resolve every value, dropping rejects and duplicates while keeping first-seen order
    pub fn resolve_all<'a>(&self, raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        raw.into_iter()
            .filter_map(|value| self.resolve(value))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

/// Compile link exclusion patterns
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|pattern| Regex::new(pattern)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> UrlFilter {
        UrlFilter::new(
            Url::parse("https://example.com/docs/page").unwrap(),
            &[r"(?i)^\s*javascript:".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_relative_and_absolute_hrefs() {
        let filter = filter();
        assert_eq!(
            filter.resolve("other"),
            Some("https://example.com/docs/other".to_string())
        );
        assert_eq!(
            filter.resolve("/about"),
            Some("https://example.com/about".to_string())
        );
        assert_eq!(
            filter.resolve("https://other.org/x"),
            Some("https://other.org/x".to_string())
        );
        assert_eq!(
            filter.resolve("//cdn.example.com/logo.png"),
            Some("https://cdn.example.com/logo.png".to_string())
        );
    }

    #[test]
    fn test_anchor_only_links_are_dropped() {
        let filter = filter();
        assert_eq!(filter.resolve("#top"), None);
        assert_eq!(filter.resolve("page#section-2"), None);
        assert_eq!(filter.resolve("https://example.com/docs/page#faq"), None);
        // A fragment on a different page is a real link
        assert_eq!(
            filter.resolve("/pricing#plans"),
            Some("https://example.com/pricing#plans".to_string())
        );
    }

    #[test]
    fn test_empty_and_excluded_values() {
        let filter = filter();
        assert_eq!(filter.resolve(""), None);
        assert_eq!(filter.resolve("   "), None);
        assert_eq!(filter.resolve("javascript:void(0)"), None);
        assert_eq!(filter.resolve("JavaScript:void(0)"), None);
    }

    #[test]
    fn test_resolve_all_deduplicates_in_order() {
        let filter = filter();
        let links = filter.resolve_all(["/a", "/b", "https://example.com/a", "#x", "", "/c", "/b"]);
        assert_eq!(
            links,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ]
        );
    }

    #[test]
    fn test_base_url_drives_resolution() {
        let filter = filter().with_base(Url::parse("https://static.example.net/assets/").unwrap());
        assert_eq!(
            filter.resolve("logo.png"),
            Some("https://static.example.net/assets/logo.png".to_string())
        );
        assert_eq!(filter.page_url().as_str(), "https://example.com/docs/page");
        // Fragment-only hrefs still point back into the page itself
        assert_eq!(filter.resolve("#top"), None);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = UrlFilter::new(Url::parse("https://example.com").unwrap(), &["(".to_string()]);
        assert!(result.is_err());
    }
}
