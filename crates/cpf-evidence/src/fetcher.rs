//! Reference page fetching.
//!
//! [`PageFetcher`] is the seam between evidence assembly and the network.
//! [`HttpFetcher`] is the production implementation; tests use
//! [`crate::fakes::StaticFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::extract::extract_main_text;

/// Browser-like User-Agent; some CPF pages reject unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Default per-page timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default ceiling on response body bytes read per page.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Retrieves the cleaned text of one reference page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its visible main-content text.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> FetchResult<String>;

    /// Infallible form: any failure is logged as a warning and yields an
    /// empty string.
    async fn fetch(&self, url: &str, timeout: Duration) -> String {
        match self.fetch_page(url, timeout).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = %url, error = %e, "Error fetching content");
                String::new()
            }
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Bytes of body read before the rest of the response is ignored
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_FETCH_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl FetcherConfig {
    /// Override the User-Agent header
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Override the body byte ceiling
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Fetches pages over HTTP(S) and extracts their main text.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: &FetcherConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(HttpFetcher {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> FetchResult<String> {
        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "fetching reference page");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = self.read_body(url, timeout, response).await?;
        Ok(extract_main_text(&body))
    }
}

impl HttpFetcher {
    /// Read at most `max_body_bytes` of the body, decoding lossily as UTF-8.
    async fn read_body(
        &self,
        url: &str,
        timeout: Duration,
        mut response: reqwest::Response,
    ) -> FetchResult<String> {
        let limit = self.max_body_bytes;
        if let Some(len) = response.content_length() {
            if len as usize > limit {
                debug!(url = %url, content_length = len, limit, "reading truncated body");
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                request_error(url, timeout, e)
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })? {
            let room = limit - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn request_error(url: &str, timeout: Duration, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_browser_user_agent() {
        let config = FetcherConfig::default();
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_with_user_agent_overrides_header() {
        let config = FetcherConfig::default().with_user_agent("cpf-advisor-test");
        assert_eq!(config.user_agent, "cpf-advisor-test");
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_network_error() {
        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let err = fetcher
            .fetch_page("not a url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
