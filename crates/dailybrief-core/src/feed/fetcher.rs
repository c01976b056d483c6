use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use url::Url;

use crate::config::FetchConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const USER_AGENT: &str = concat!("dailybrief/", env!("CARGO_PKG_VERSION"));

/// Fetches one raw feed body by URL.
///
/// The collector depends on this seam rather than on a concrete HTTP
/// client, so tests can substitute canned responses.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP client for pulling raw feed bodies.
///
/// One GET per source, no retries: a failing source contributes zero
/// articles to the run and the next scheduled run tries again.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FetchFeed for FeedFetcher {
    /// Fetch a feed body, enforcing the size cap.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url)?;
        tracing::debug!("Fetching feed from: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {} for URL: {}", status, url)));
        }

        let body = response.bytes().await?;
        if body.len() > MAX_FEED_BYTES {
            return Err(Error::Fetch(format!(
                "Feed too large ({} bytes) for URL: {}",
                body.len(),
                url
            )));
        }

        Ok(body.to_vec())
    }
}
