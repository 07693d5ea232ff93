//! Paged, rate-limited arXiv client

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ArxivConfig;
use crate::error::{ArxivError, ArxivResult};
use crate::feed::{ArxivEntry, FeedPage, parse_feed};
use crate::query::SearchQuery;

/// HTTP client for the arXiv query API
///
/// Pages are fetched sequentially with `config.delay` between requests.
/// A failing page is retried up to `config.retries` times before the
/// error is returned.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    http: reqwest::Client,
    config: ArxivConfig,
}

impl ArxivClient {
    pub fn new(config: ArxivConfig) -> ArxivResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ArxivError::Client(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ArxivConfig {
        &self.config
    }

    /// Run a search, collecting up to `query.max_results` entries
    pub async fn search(&self, query: &SearchQuery) -> ArxivResult<Vec<ArxivEntry>> {
        let mut entries: Vec<ArxivEntry> = Vec::new();
        let mut start = 0;

        while entries.len() < query.max_results {
            let page_size = self.config.page_size.min(query.max_results - entries.len());
            if start > 0 {
                sleep(self.config.delay).await;
            }

            let page = self.fetch_page_with_retries(query, start, page_size).await?;
            let received = page.entries.len();
            debug!(
                "arXiv page at {} returned {} of {} results",
                start, received, page.total_results
            );
            if received == 0 {
                break;
            }

            start += received;
            entries.extend(page.entries);
            if start >= page.total_results {
                break;
            }
        }

        entries.truncate(query.max_results);
        info!(
            "arXiv search '{}' returned {} entries",
            query.query,
            entries.len()
        );
        Ok(entries)
    }

    async fn fetch_page_with_retries(
        &self,
        query: &SearchQuery,
        start: usize,
        page_size: usize,
    ) -> ArxivResult<FeedPage> {
        let mut attempt = 0;
        loop {
            match self.fetch_page(query, start, page_size).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(
                        "arXiv request failed ({}), retry {}/{}",
                        e, attempt, self.config.retries
                    );
                    sleep(self.config.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        start: usize,
        page_size: usize,
    ) -> ArxivResult<FeedPage> {
        let url = query.page_url(&self.config.base_url, start, page_size)?;
        debug!("GET {}", url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArxivError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let page = parse_feed(&body)?;
        // Only the first page is retried when empty; later empty pages end paging
        if page.entries.is_empty() && start == 0 && page.total_results > 0 {
            return Err(ArxivError::EmptyPage {
                url: url.to_string(),
                start,
            });
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::fixtures::{TWO_ENTRIES, empty_page};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned `(status, body)` responses in order, one per connection
    async fn canned_server(responses: Vec<(u16, String)>) -> (String, Arc<AtomicUsize>) {
        let (base, hits, _) = recording_server(responses).await;
        (base, hits)
    }

    /// Like `canned_server`, also keeping the request target of every request
    async fn recording_server(
        responses: Vec<(u16, String)>,
    ) -> (String, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let targets = Arc::new(Mutex::new(Vec::new()));
        let counter = Arc::clone(&hits);
        let recorded = Arc::clone(&targets);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap();
                let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                if let Some(target) = request.split_whitespace().nth(1) {
                    recorded.lock().unwrap().push(target.to_string());
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/atom+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/api/query"), hits, targets)
    }

    /// The two-entry fixture claiming `total` results overall
    fn two_of(total: usize) -> String {
        TWO_ENTRIES.replace(
            ">2</opensearch:totalResults>",
            &format!(">{total}</opensearch:totalResults>"),
        )
    }

    fn query_param(target: &str, name: &str) -> Option<String> {
        let url = url::Url::parse(&format!("http://localhost{target}")).unwrap();
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn test_client(base_url: String, retries: u32) -> ArxivClient {
        ArxivClient::new(
            ArxivConfig::default()
                .with_base_url(base_url)
                .with_delay(Duration::from_millis(1))
                .with_retries(retries)
                .with_timeout(Duration::from_secs(5)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_single_page() {
        let (base, hits) = canned_server(vec![(200, TWO_ENTRIES.to_string())]).await;
        let client = test_client(base, 0);

        let entries = client
            .search(&SearchQuery::new("attention").with_max_results(5))
            .await
            .unwrap();

        // totalResults is 2, so no second page is requested
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].short_id(), "2101.00001v2");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_truncates_to_max_results() {
        let (base, _) = canned_server(vec![(200, TWO_ENTRIES.to_string())]).await;
        let client = test_client(base, 0);

        let entries = client
            .search(&SearchQuery::new("attention").with_max_results(1))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let (base, hits) = canned_server(vec![
            (503, "busy".to_string()),
            (200, TWO_ENTRIES.to_string()),
        ])
        .await;
        let client = test_client(base, 2);

        let entries = client
            .search(&SearchQuery::new("attention").with_max_results(2))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_unexpected_empty_page() {
        let (base, hits) = canned_server(vec![
            (200, empty_page(7)),
            (200, TWO_ENTRIES.to_string()),
        ])
        .await;
        let client = test_client(base, 1);

        let entries = client
            .search(&SearchQuery::new("attention").with_max_results(2))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let (base, hits) = canned_server(vec![
            (500, "oops".to_string()),
            (500, "oops".to_string()),
        ])
        .await;
        let client = test_client(base, 1);

        let err = client
            .search(&SearchQuery::new("attention"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArxivError::Status { status: 500, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (base, hits) = canned_server(vec![(400, "bad query".to_string())]).await;
        let client = test_client(base, 3);

        let err = client
            .search(&SearchQuery::new("attention"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArxivError::Status { status: 400, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_results() {
        let (base, _) = canned_server(vec![(200, empty_page(0))]).await;
        let client = test_client(base, 0);

        let entries = client
            .search(&SearchQuery::new("zzzzqqq"))
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_search_pages_through_results() {
        let (base, hits, targets) =
            recording_server(vec![(200, two_of(10)), (200, two_of(10))]).await;
        let client = ArxivClient::new(
            ArxivConfig::default()
                .with_base_url(base)
                .with_page_size(2)
                .with_delay(Duration::from_millis(1))
                .with_retries(0)
                .with_timeout(Duration::from_secs(5)),
        )
        .unwrap();

        let entries = client
            .search(&SearchQuery::new("attention").with_max_results(3))
            .await
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        let targets = targets.lock().unwrap().clone();
        assert_eq!(query_param(&targets[0], "start").as_deref(), Some("0"));
        assert_eq!(query_param(&targets[0], "max_results").as_deref(), Some("2"));
        assert_eq!(query_param(&targets[1], "start").as_deref(), Some("2"));
        // Only one entry is still missing
        assert_eq!(query_param(&targets[1], "max_results").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_empty_later_page_keeps_collected_entries() {
        let (base, hits, targets) =
            recording_server(vec![(200, two_of(5)), (200, empty_page(5))]).await;
        let client = ArxivClient::new(
            ArxivConfig::default()
                .with_base_url(base)
                .with_page_size(2)
                .with_delay(Duration::from_millis(1))
                .with_retries(0)
                .with_timeout(Duration::from_secs(5)),
        )
        .unwrap();

        let entries = client
            .search(&SearchQuery::new("attention").with_max_results(5))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].short_id(), "2101.00001v2");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        let targets = targets.lock().unwrap().clone();
        assert_eq!(query_param(&targets[1], "start").as_deref(), Some("2"));
    }
}
