//! HTTP fetch collaborator.
//!
//! The pipeline only ever issues GETs and only needs response bodies, so the
//! whole transport sits behind [`Fetcher`]. Retry policy, timeouts and
//! proxying belong to the implementation — the core performs no retries of
//! its own and treats a failed fetch as a resolution failure.

use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Browser UA the platform expects; API responses differ for unknown agents.
const PLATFORM_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

const PLATFORM_REFERER: &str = "https://www.bilibili.com";

/// Generic HTTP GET collaborator.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Transport`] on network failure or a
    /// non-success HTTP status.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Default reqwest-backed fetcher sending the platform headers.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with a pooled client and the platform default headers.
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(PLATFORM_REFERER));
        headers.insert(USER_AGENT, HeaderValue::from_static(PLATFORM_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Wrap an existing client (custom timeouts, proxies, cookies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ResolveError::Transport(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_platform_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("referer", PLATFORM_REFERER))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let body = fetcher.fetch(&server.uri()).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Transport(_)));
    }
}
