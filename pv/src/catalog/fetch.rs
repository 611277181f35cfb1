use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Well-known public catalog
pub const DEFAULT_CATALOG_URL: &str = "https://raw.githubusercontent.com/codefrydev/Data/refs/heads/main/Prompt/data.json";

/// Responses larger than this are rejected
pub const MAX_CATALOG_BYTES: usize = 10 * 1024 * 1024;

const USER_AGENT: &str = concat!("PromptVault/", env!("CARGO_PKG_VERSION"), " (catalog refresh)");

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("Response too large ({0} bytes)")]
    TooLarge(usize),
}

/// Source of raw catalog bytes
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP GET of a single URL
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    /// Build a fetcher whose every request is bounded by `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        debug!(%url, ?timeout, "HttpFetcher::new: called");
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        debug!(url = %self.url, "HttpFetcher::fetch: called");
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(FetchError::InvalidUrl(self.url.clone()));
        }

        let mut response = self.client.get(&self.url).send().await?;
        debug!(status = %response.status(), "HttpFetcher::fetch: response received");
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        if let Some(len) = response.content_length() {
            let len = usize::try_from(len).unwrap_or(usize::MAX);
            if len > MAX_CATALOG_BYTES {
                return Err(FetchError::TooLarge(len));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_CATALOG_BYTES {
                return Err(FetchError::TooLarge(body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }
        debug!(len = body.len(), "HttpFetcher::fetch: body read");
        Ok(body)
    }
}
