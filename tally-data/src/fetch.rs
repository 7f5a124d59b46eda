use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tally_core::{DateChunk, LogRequest, Page, RawLogEntry};
use tracing::{debug, error, warn};

const DEFAULT_PAGE_LIMIT: usize = 50;
const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(50);

/// Remote capability answering one page request at a time.
///
/// Implementations own the transport; the fetch engine only relies on the
/// request/response contract.
#[async_trait]
pub trait LogQuery: Send + Sync {
    async fn query(&self, request: LogRequest) -> Result<Page>;
}

#[async_trait]
impl<T> LogQuery for Arc<T>
where
    T: LogQuery + ?Sized,
{
    async fn query(&self, request: LogRequest) -> Result<Page> {
        (**self).query(request).await
    }
}

#[async_trait]
impl<T> LogQuery for Box<T>
where
    T: LogQuery + ?Sized,
{
    async fn query(&self, request: LogRequest) -> Result<Page> {
        (**self).query(request).await
    }
}

/// Pagination knobs for a single chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchSettings {
    pub page_limit: usize,
    pub page_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

impl FetchSettings {
    #[must_use]
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
}

/// Drains one date chunk by following continuation cursors.
pub struct PaginatedFetcher<Q> {
    query: Q,
    settings: FetchSettings,
}

impl<Q: LogQuery> PaginatedFetcher<Q> {
    pub fn new(query: Q, settings: FetchSettings) -> Self {
        Self { query, settings }
    }

    /// Fetch every record of `chunk`, in page-arrival order.
    ///
    /// Never fails: a page without an item list ends the chunk, and a failed
    /// page request returns whatever earlier pages produced.
    pub async fn fetch(&self, chunk: &DateChunk) -> Vec<RawLogEntry> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 1usize;

        loop {
            let request = LogRequest {
                start_time: chunk.start_time(),
                end_time: chunk.end_time(),
                limit: self.settings.page_limit,
                cursor: cursor.clone(),
            };
            debug!(
                page,
                start = %request.start_time,
                end = %request.end_time,
                cursor = ?request.cursor,
                "fetching transaction log page"
            );

            let response = match self.query.query(request).await {
                Ok(response) => response,
                Err(err) => {
                    let message = format!("{err:#}");
                    error!(page, %chunk, error = %message, "failed to fetch transaction log page");
                    return items;
                }
            };

            let next = response.continuation().map(str::to_owned);
            let Some(batch) = response.items else {
                warn!(page, %chunk, "transaction log response carried no item list");
                return items;
            };
            debug!(page, items = batch.len(), "received transaction log page");
            items.extend(batch);

            let Some(next) = next else {
                return items;
            };
            if cursor.as_deref() == Some(next.as_str()) {
                warn!(page, %chunk, cursor = %next, "remote repeated its cursor; stopping pagination");
                return items;
            }
            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
            cursor = Some(next);
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedQuery;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn chunk() -> DateChunk {
        DateChunk::new(
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 7).unwrap(),
        )
    }

    fn entry(id: &str) -> RawLogEntry {
        let ts = Utc.with_ymd_and_hms(2024, 11, 2, 10, 0, 0).unwrap();
        RawLogEntry::new("USDT", Decimal::ONE, ts).with_trade_id(id)
    }

    fn ids(items: &[RawLogEntry]) -> Vec<&str> {
        items.iter().filter_map(|e| e.trade_id.as_deref()).collect()
    }

    fn immediate() -> FetchSettings {
        FetchSettings::default().with_page_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn follows_cursor_until_exhausted() {
        let query = Arc::new(
            ScriptedQuery::new()
                .with_page(Page::new(vec![entry("a"), entry("b")]).with_cursor("next-1"))
                .with_page(Page::new(vec![entry("c")])),
        );
        let fetcher = PaginatedFetcher::new(query.clone(), immediate());

        let items = fetcher.fetch(&chunk()).await;

        assert_eq!(ids(&items), vec!["a", "b", "c"]);
        let requests = query.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].cursor, None);
        assert_eq!(requests[1].cursor.as_deref(), Some("next-1"));
        assert_eq!(requests[0].limit, 50);
        assert_eq!(requests[0].start_time, chunk().start_time());
        assert_eq!(requests[1].end_time, chunk().end_time());
    }

    #[tokio::test]
    async fn failed_page_returns_earlier_pages() {
        let query = Arc::new(
            ScriptedQuery::new()
                .with_page(Page::new(vec![entry("a")]).with_cursor("next-1"))
                .with_error("connection reset by peer"),
        );
        let fetcher = PaginatedFetcher::new(query.clone(), immediate());

        let items = fetcher.fetch(&chunk()).await;

        assert_eq!(ids(&items), vec!["a"]);
        assert_eq!(query.calls(), 2);
    }

    #[tokio::test]
    async fn failure_on_first_page_yields_nothing() {
        let query = ScriptedQuery::new().with_error("timeout");
        let fetcher = PaginatedFetcher::new(query, immediate());
        assert!(fetcher.fetch(&chunk()).await.is_empty());
    }

    #[tokio::test]
    async fn missing_list_ends_pagination() {
        let query = Arc::new(
            ScriptedQuery::new()
                .with_page(Page::new(vec![entry("a")]).with_cursor("next-1"))
                .with_page(Page::without_list().with_cursor("next-2"))
                .with_page(Page::new(vec![entry("never")])),
        );
        let fetcher = PaginatedFetcher::new(query.clone(), immediate());

        let items = fetcher.fetch(&chunk()).await;

        assert_eq!(ids(&items), vec!["a"]);
        assert_eq!(query.calls(), 2);
    }

    #[tokio::test]
    async fn empty_pages_do_not_stop_a_live_cursor() {
        let query = Arc::new(
            ScriptedQuery::new()
                .with_page(Page::new(Vec::new()).with_cursor("next-1"))
                .with_page(Page::new(vec![entry("a"), entry("a")]).with_cursor("")),
        );
        let fetcher = PaginatedFetcher::new(query.clone(), immediate());

        let items = fetcher.fetch(&chunk()).await;

        assert_eq!(ids(&items), vec!["a", "a"]);
        assert_eq!(query.calls(), 2);
    }

    #[tokio::test]
    async fn repeated_cursor_stops_pagination() {
        let query = Arc::new(
            ScriptedQuery::new()
                .with_page(Page::new(vec![entry("a")]).with_cursor("same"))
                .with_page(Page::new(vec![entry("b")]).with_cursor("same"))
                .with_page(Page::new(vec![entry("c")])),
        );
        let fetcher = PaginatedFetcher::new(query.clone(), immediate());

        let items = fetcher.fetch(&chunk()).await;

        assert_eq!(ids(&items), vec!["a", "b"]);
        assert_eq!(query.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_pages_only() {
        let query = ScriptedQuery::new()
            .with_page(Page::new(vec![entry("a")]).with_cursor("1"))
            .with_page(Page::new(vec![entry("b")]).with_cursor("2"))
            .with_page(Page::new(vec![entry("c")]));
        let settings = FetchSettings::default()
            .with_page_limit(10)
            .with_page_delay(Duration::from_millis(250));
        let fetcher = PaginatedFetcher::new(query, settings);

        let started = tokio::time::Instant::now();
        let items = fetcher.fetch(&chunk()).await;

        assert_eq!(items.len(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(750), "elapsed {elapsed:?}");
    }
}
