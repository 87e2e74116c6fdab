//! HTTP client abstraction for testability.
//!
//! The resolver and provisioner depend on [`HttpFetch`] rather than a
//! concrete client, so tests inject a scripted fetcher and never touch
//! the network.

use std::future::Future;
use std::time::Duration;

use super::types::FetchError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Asynchronous HTTP GET capability.
///
/// Tile fetching needs exactly one verb. Any non-2xx response must be
/// reported as an error; callers never inspect response bodies on
/// failure.
pub trait HttpFetch: Send + Sync {
    /// Fetch `url` and return the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Real HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// A fetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// A fetcher with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
