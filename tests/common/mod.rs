//! Shared helpers: an in-process server on an ephemeral port and a small MCP client

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use research_papers_arxiv::{ArxivEntry, ArxivResult, SearchQuery};
use research_papers_server::{PaperSearch, ServerConfig, research_server_with_search};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Search backend answering every query with the same entries
#[derive(Default)]
pub struct CannedSearch {
    entries: Vec<ArxivEntry>,
}

impl CannedSearch {
    pub fn new(entries: Vec<ArxivEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl PaperSearch for CannedSearch {
    async fn search(&self, query: &SearchQuery) -> ArxivResult<Vec<ArxivEntry>> {
        Ok(self
            .entries
            .iter()
            .take(query.max_results)
            .cloned()
            .collect())
    }
}

pub fn entry(id: &str, title: &str) -> ArxivEntry {
    let published = Utc.with_ymd_and_hms(2023, 6, 12, 17, 57, 34).unwrap();
    ArxivEntry {
        entry_id: format!("http://arxiv.org/abs/{}", id),
        title: title.to_string(),
        authors: vec!["Ashish Vaswani".to_string(), "Noam Shazeer".to_string()],
        summary: format!("We study {}.", title.to_lowercase()),
        published,
        updated: published,
        pdf_url: Some(format!("http://arxiv.org/pdf/{}", id)),
        primary_category: Some("cs.CL".to_string()),
        categories: vec!["cs.CL".to_string(), "cs.LG".to_string()],
        comment: None,
        journal_ref: None,
        doi: None,
    }
}

/// Server bound to 127.0.0.1:0 with a scratch paper directory
pub struct TestServer {
    pub addr: SocketAddr,
    pub paper_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(CannedSearch::new(vec![
            entry("1706.03762v7", "Attention Is All You Need"),
            entry("1810.04805v2", "BERT Pre-training"),
        ]))
        .await
    }

    pub async fn start_with(search: CannedSearch) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("research_papers=debug")
            .with_test_writer()
            .try_init();

        let paper_dir = TempDir::new().unwrap();
        let config = ServerConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            paper_dir: paper_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let server = research_server_with_search(config, Arc::new(search)).unwrap();
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown, stopped) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = stopped.await;
                })
                .await;
        });

        Self {
            addr,
            paper_dir,
            shutdown: Some(shutdown),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Streamable HTTP client holding the session id from `initialize`
pub struct McpTestClient {
    client: reqwest::Client,
    endpoint: String,
    pub session_id: Option<String>,
    next_id: i64,
}

impl McpTestClient {
    pub fn new(server: &TestServer) -> Self {
        Self {
            client: http_client(),
            endpoint: server.url("/mcp"),
            session_id: None,
            next_id: 1,
        }
    }

    pub async fn initialize(&mut self) -> Value {
        let response = self
            .post(json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {},
                    "clientInfo": {"name": "integration-test", "version": "1.0.0"}
                }
            }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        self.session_id = response
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        assert!(self.session_id.is_some(), "initialize returned no session id");

        let body: Value = response.json().await.unwrap();
        let status = self
            .post(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await
            .status();
        assert_eq!(status, reqwest::StatusCode::ACCEPTED);
        body
    }

    /// Send a request and return the whole JSON-RPC response object
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let response = self
            .post(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["id"], id);
        body
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let body = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        body["result"].clone()
    }

    pub async fn post(&self, message: Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("mcp-protocol-version", "2025-06-18")
            .body(message.to_string());
        if let Some(session_id) = &self.session_id {
            request = request.header("mcp-session-id", session_id);
        }
        request.send().await.unwrap()
    }
}
