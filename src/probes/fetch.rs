//! Timeout-bounded HTTP access for the probes.

use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_ENCODING};
use reqwest::{Client, StatusCode, Url};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::HealthConfig;
use crate::error::ProbeError;

/// A fetched page with the signals the probes need.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    /// Time until the full body was read.
    pub elapsed: Duration,
    pub size_bytes: usize,
}

impl FetchedPage {
    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }
}

/// Shared HTTP client with the configured timeout and user agent.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &HealthConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// GETs `url` and reads the whole body as text.
    pub async fn get(&self, url: &Url) -> Result<FetchedPage, ProbeError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
            .send()
            .await
            .map_err(|source| ProbeError::Request {
                url: url.to_string(),
                source,
            })?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| ProbeError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let elapsed = start.elapsed();

        debug!(
            "GET {} -> {} ({} bytes, {}ms)",
            url,
            status,
            bytes.len(),
            elapsed.as_millis()
        );

        Ok(FetchedPage {
            url: final_url,
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            elapsed,
            size_bytes: bytes.len(),
        })
    }

    /// Response headers for a GET that advertises compression support.
    ///
    /// The body is discarded; it may be compressed.
    pub async fn compressed_headers(&self, url: &Url) -> Result<HeaderMap, ProbeError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT_ENCODING, "gzip, deflate, br")
            .send()
            .await
            .map_err(|source| ProbeError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(response.headers().clone())
    }

    /// Status code of `url`, using HEAD and falling back to GET when HEAD
    /// is not allowed.
    pub async fn status_of(&self, url: &Url) -> Result<StatusCode, ProbeError> {
        let to_error = |source| ProbeError::Request {
            url: url.to_string(),
            source,
        };

        let status = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(to_error)?
            .status();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            let response = self.client.get(url.clone()).send().await.map_err(to_error)?;
            return Ok(response.status());
        }
        Ok(status)
    }
}
