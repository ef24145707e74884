//! In-memory page fetcher (testing only)
//!
//! `StaticFetcher` serves canned page text per URL and records every call, so
//! tests can assert both on assembled evidence and on whether the network
//! would have been touched at all.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};
use crate::fetcher::PageFetcher;

#[derive(Debug, Clone)]
enum FakePage {
    Text(String),
    Slow { delay: Duration, text: String },
    Status(u16),
    Unreachable,
}

/// Fetcher backed by a `HashMap<url, page>`. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, FakePage>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for `url`.
    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        self.pages
            .insert(url.to_string(), FakePage::Text(text.to_string()));
        self
    }

    /// Serve `text` for `url` after sleeping for `delay`.
    pub fn with_slow_page(mut self, url: &str, delay: Duration, text: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage::Slow {
                delay,
                text: text.to_string(),
            },
        );
        self
    }

    /// Answer `url` with a non-2xx status.
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), FakePage::Status(status));
        self
    }

    /// Fail `url` as if the host could not be reached.
    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), FakePage::Unreachable);
        self
    }

    /// URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> FetchResult<String> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.pages.get(url).cloned() {
            Some(FakePage::Text(text)) => Ok(text),
            Some(FakePage::Slow { delay, text }) => {
                if delay > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(FakePage::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(FakePage::Unreachable) => Err(FetchError::Network {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_serves_pages_and_records_calls() {
        let fetcher = StaticFetcher::new()
            .with_page("https://a.test/", "alpha")
            .with_status("https://b.test/", 500);

        let timeout = Duration::from_secs(1);
        assert_eq!(fetcher.fetch("https://a.test/", timeout).await, "alpha");
        assert_eq!(fetcher.fetch("https://b.test/", timeout).await, "");
        assert!(fetcher.fetch_page("https://c.test/", timeout).await.is_err());

        assert_eq!(
            fetcher.calls(),
            vec!["https://a.test/", "https://b.test/", "https://c.test/"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_page_beyond_timeout_times_out() {
        let fetcher =
            StaticFetcher::new().with_slow_page("https://slow.test/", Duration::from_secs(30), "late");
        let err = fetcher
            .fetch_page("https://slow.test/", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }
}
