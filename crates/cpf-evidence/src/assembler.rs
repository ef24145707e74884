//! Evidence assembly: fetch, clean and cap reference pages for one query.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use crate::fetcher::{PageFetcher, DEFAULT_FETCH_TIMEOUT};

/// Maximum characters of content kept per page.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 8000;

/// Appended to content that was cut at the cap.
pub const TRUNCATION_MARKER: &str = "...";

/// Cleaned text extracted from one reference URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub url: String,
    pub content: String,
}

/// Limits applied while gathering evidence.
#[derive(Debug, Clone)]
pub struct GatherConfig {
    /// Maximum number of in-flight page fetches.
    pub max_concurrency: usize,
    /// Timeout applied to each page fetch.
    pub fetch_timeout: Duration,
    /// Deadline for the whole gathering phase. Pages not fetched by then are
    /// dropped; records completed before it are kept.
    pub deadline: Duration,
    /// Content cap in characters, excluding the truncation marker.
    pub max_content_chars: usize,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            deadline: Duration::from_secs(30),
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}

/// A page that contributed no evidence.
#[derive(Debug)]
pub struct FetchFailure {
    pub url: String,
    pub error: FetchError,
}

/// Outcome of a gathering pass.
#[derive(Debug, Default)]
pub struct GatherReport {
    /// Records in input URL order.
    pub records: Vec<EvidenceRecord>,
    /// Pages that failed to fetch, in completion order.
    pub failures: Vec<FetchFailure>,
    /// Pages that fetched successfully but had no visible text.
    pub empty: Vec<String>,
    /// True when the phase deadline cut gathering short.
    pub timed_out: bool,
}

/// Composes a [`PageFetcher`] into an ordered list of [`EvidenceRecord`]s.
#[derive(Clone)]
pub struct EvidenceAssembler {
    fetcher: Arc<dyn PageFetcher>,
    config: GatherConfig,
}

impl EvidenceAssembler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: GatherConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &GatherConfig {
        &self.config
    }

    /// Gather evidence for `urls`, preserving their order and omitting pages
    /// that failed or had no text.
    pub async fn gather(&self, urls: &[String]) -> Vec<EvidenceRecord> {
        self.gather_report(urls).await.records
    }

    /// Like [`gather`](Self::gather), also reporting which pages were dropped.
    #[instrument(skip(self, urls), fields(url_count = urls.len()))]
    pub async fn gather_report(&self, urls: &[String]) -> GatherReport {
        let timeout = self.config.fetch_timeout;
        let max_chars = self.config.max_content_chars;

        let fetches = futures::stream::iter(urls.iter().cloned().enumerate())
            .map(|(index, url)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch_page(&url, timeout).await;
                    (index, url, result)
                }
            })
            .buffer_unordered(self.config.max_concurrency.max(1));
        tokio::pin!(fetches);

        let deadline = tokio::time::sleep(self.config.deadline);
        tokio::pin!(deadline);

        let mut report = GatherReport::default();
        let mut completed = Vec::with_capacity(urls.len());
        loop {
            tokio::select! {
                next = fetches.next() => match next {
                    Some((index, url, Ok(raw))) => match clean_content(&raw, max_chars) {
                        Some(content) => completed.push((index, EvidenceRecord { url, content })),
                        None => {
                            debug!(url = %url, "page had no visible text");
                            report.empty.push(url);
                        }
                    },
                    Some((_, url, Err(error))) => {
                        warn!(url = %url, error = %error, "Error fetching content");
                        report.failures.push(FetchFailure { url, error });
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    warn!(
                        deadline_ms = self.config.deadline.as_millis() as u64,
                        gathered = completed.len(),
                        "evidence deadline reached; keeping partial results"
                    );
                    report.timed_out = true;
                    break;
                }
            }
        }

        completed.sort_by_key(|(index, _)| *index);
        report.records = completed.into_iter().map(|(_, record)| record).collect();
        report
    }
}

/// Collapse whitespace runs to single spaces and cap at `max_chars`
/// characters, appending [`TRUNCATION_MARKER`] when cut.
///
/// Returns `None` when nothing visible remains.
pub fn clean_content(raw: &str, max_chars: usize) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = collapsed[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            Some(truncated)
        }
        None => Some(collapsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StaticFetcher;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_clean_content_collapses_whitespace() {
        assert_eq!(
            clean_content("  CPF\n\n housing\t grant  ", 100).as_deref(),
            Some("CPF housing grant")
        );
    }

    #[test]
    fn test_clean_content_blank_is_none() {
        assert_eq!(clean_content(" \n\t ", 100), None);
    }

    #[test]
    fn test_clean_content_truncates_with_marker() {
        let cleaned = clean_content("abcdefghij", 4).unwrap();
        assert_eq!(cleaned, "abcd...");
    }

    #[test]
    fn test_clean_content_at_exact_cap_is_untouched() {
        assert_eq!(clean_content("abcd", 4).as_deref(), Some("abcd"));
    }

    #[test]
    fn test_clean_content_counts_characters_not_bytes() {
        let cleaned = clean_content("ééééé", 3).unwrap();
        assert_eq!(cleaned, "ééé...");
    }

    #[tokio::test]
    async fn test_gather_preserves_order_and_skips_failures() {
        let fetcher = StaticFetcher::new()
            .with_page("https://a.test/", "first page")
            .with_unreachable("https://b.test/")
            .with_page("https://c.test/", "   ")
            .with_page("https://d.test/", "fourth\n\npage");
        let assembler = EvidenceAssembler::new(Arc::new(fetcher), GatherConfig::default());

        let report = assembler
            .gather_report(&urls(&[
                "https://a.test/",
                "https://b.test/",
                "https://c.test/",
                "https://d.test/",
            ]))
            .await;

        assert_eq!(
            report.records,
            vec![
                EvidenceRecord {
                    url: "https://a.test/".to_string(),
                    content: "first page".to_string(),
                },
                EvidenceRecord {
                    url: "https://d.test/".to_string(),
                    content: "fourth page".to_string(),
                },
            ]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, "https://b.test/");
        assert_eq!(report.empty, vec!["https://c.test/".to_string()]);
        assert!(!report.timed_out);
    }

    #[tokio::test]
    async fn test_gather_never_exceeds_cap_plus_marker() {
        let long_page = "word ".repeat(5000);
        let fetcher = StaticFetcher::new().with_page("https://long.test/", &long_page);
        let assembler = EvidenceAssembler::new(Arc::new(fetcher), GatherConfig::default());

        let records = assembler.gather(&urls(&["https://long.test/"])).await;
        assert_eq!(records.len(), 1);
        let content = &records[0].content;
        assert_eq!(
            content.chars().count(),
            DEFAULT_MAX_CONTENT_CHARS + TRUNCATION_MARKER.len()
        );
        assert!(content.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_gather_empty_input_makes_no_calls() {
        let fetcher = Arc::new(StaticFetcher::new());
        let assembler = EvidenceAssembler::new(fetcher.clone(), GatherConfig::default());

        assert!(assembler.gather(&[]).await.is_empty());
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_partial_results() {
        let fetcher = StaticFetcher::new()
            .with_page("https://fast.test/", "fast")
            .with_slow_page("https://slow.test/", Duration::from_secs(8), "slow");
        let config = GatherConfig {
            max_concurrency: 1,
            fetch_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(5),
            ..GatherConfig::default()
        };
        let assembler = EvidenceAssembler::new(Arc::new(fetcher), config);

        let report = assembler
            .gather_report(&urls(&["https://fast.test/", "https://slow.test/"]))
            .await;

        assert!(report.timed_out);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].url, "https://fast.test/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_pages_finished_behind_a_slow_one() {
        let fetcher = StaticFetcher::new()
            .with_slow_page("https://slow.test/", Duration::from_secs(8), "slow")
            .with_page("https://fast.test/", "fast")
            .with_slow_page("https://medium.test/", Duration::from_secs(2), "medium");
        let config = GatherConfig {
            max_concurrency: 3,
            fetch_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(5),
            ..GatherConfig::default()
        };
        let assembler = EvidenceAssembler::new(Arc::new(fetcher), config);

        let report = assembler
            .gather_report(&urls(&[
                "https://slow.test/",
                "https://medium.test/",
                "https://fast.test/",
            ]))
            .await;

        assert!(report.timed_out);
        let gathered: Vec<_> = report.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(gathered, vec!["https://medium.test/", "https://fast.test/"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_run_concurrently_within_bound() {
        let fetcher = StaticFetcher::new()
            .with_slow_page("https://one.test/", Duration::from_secs(4), "one")
            .with_slow_page("https://two.test/", Duration::from_secs(4), "two")
            .with_slow_page("https://three.test/", Duration::from_secs(4), "three");
        let config = GatherConfig {
            max_concurrency: 3,
            deadline: Duration::from_secs(6),
            ..GatherConfig::default()
        };
        let assembler = EvidenceAssembler::new(Arc::new(fetcher), config);

        let report = assembler
            .gather_report(&urls(&[
                "https://one.test/",
                "https://two.test/",
                "https://three.test/",
            ]))
            .await;

        // Sequential fetching would need 12s and blow the 6s deadline.
        assert!(!report.timed_out);
        let order: Vec<_> = report.records.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, vec!["one", "two", "three"]);
    }
}
