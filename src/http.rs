//! Outbound HTTP.
//!
//! One [`reqwest::Client`] is built per invocation and shared by every
//! request. Each request runs under its own [`tokio::time::timeout`]; when
//! the deadline passes, the request future is dropped, which aborts the
//! connection without touching any sibling request.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Error, NetworkError, Result};

/// Preference for plain text and markdown; advisory only.
pub const ACCEPT_HEADER: &str = "text/plain, text/markdown;q=0.9, */*;q=0.8";

/// Shared client plus the per-request timeout it applies.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return the response body as text.
    ///
    /// The timeout covers the whole exchange: connect, headers and body.
    pub async fn get_text(&self, url: &str) -> Result<String, NetworkError> {
        debug!(url, timeout_secs = self.timeout.as_secs(), "GET");

        match tokio::time::timeout(self.timeout, self.send(url)).await {
            Ok(result) => result,
            Err(_) => Err(NetworkError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }

    async fn send(&self, url: &str) -> Result<String, NetworkError> {
        let connection = |e: reqwest::Error| NetworkError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(connection)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpStatus {
                url: url.to_string(),
                code: status.as_u16(),
                text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response.text().await.map_err(connection)
    }
}
