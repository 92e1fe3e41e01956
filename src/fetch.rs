//! Plain HTTP retrieval of a page, without running any of its scripts.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::FetchError;

const MAX_REDIRECTS: usize = 10;

/// A 2xx response body together with the URL it was finally served from
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl StaticFetcher {
    pub fn new(config: &ScraperConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeouts.fetch())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            client,
            timeout_secs: config.timeouts.fetch_secs,
        }
    }

    /// GET `url`, following redirects, and return the body of a 2xx response
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        ::log::debug!("Fetching {} statically", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FetchError::from_reqwest(e, self.timeout_secs))?;

        let final_url = response.url().clone();
        if &final_url != url {
            ::log::debug!("{} redirected to {}", url, final_url);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout_secs))?;

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}
