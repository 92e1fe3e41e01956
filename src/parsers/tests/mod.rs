
use url::Url;

use crate::config::ScraperConfig;
use crate::filter::UrlFilter;
use crate::parsers::{PageExtract, extract_page};

const PAGE_URL: &str = "https://example.com/page";

fn extract(markup: &str) -> PageExtract {
    let url = Url::parse(PAGE_URL).unwrap();
    let config = ScraperConfig::default();
    let filter = UrlFilter::new(url.clone(), &config.exclude_link_patterns).unwrap();
    extract_page(markup, &url, &filter, &config).unwrap()
}
