use crate::error::{FetchError, Result};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A fetched page body with the metadata the analyzer needs.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after redirects. Relative links on the page resolve against it.
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchResponse {
    /// Missing content type is treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(true)
    }
}

/// Network access used by the crawler.
///
/// `fetch` downloads a page; `probe` is the lightweight liveness check used
/// for broken-link detection and for the root status.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = std::result::Result<FetchResponse, FetchError>> + Send;

    fn probe(&self, url: &str) -> impl Future<Output = std::result::Result<u16, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: Client,
    fetch_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, fetch_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(fetch_timeout / 2)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            fetch_timeout,
            probe_timeout,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchResponse, FetchError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(FetchResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }

    async fn probe(&self, url: &str) -> std::result::Result<u16, FetchError> {
        let response = self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if status != StatusCode::METHOD_NOT_ALLOWED && status != StatusCode::NOT_IMPLEMENTED {
            return Ok(status.as_u16());
        }

        debug!("HEAD not supported by {}, retrying with GET", url);
        let response = self
            .client
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(response.status().as_u16())
    }
}
