//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use research_papers_arxiv::ArxivConfig;

/// Upper bound for `search_papers.max_results`
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 100;

/// Configuration for the HTTP MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Streamable HTTP endpoint
    pub mcp_path: String,
    /// Legacy SSE stream endpoint
    pub sse_path: String,
    /// Legacy SSE message POST endpoint
    pub messages_path: String,
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Idle sessions older than this are dropped by the cleanup task
    pub session_expiry_minutes: u64,
    /// Interval between SSE keep-alive comments
    pub keep_alive_interval: Duration,
    /// Root of the topic directories
    pub paper_dir: PathBuf,
    pub max_search_results: usize,
    pub arxiv: ArxivConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            mcp_path: "/mcp".to_string(),
            sse_path: "/sse".to_string(),
            messages_path: "/messages/".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
            session_expiry_minutes: 30,
            keep_alive_interval: Duration::from_secs(15),
            paper_dir: PathBuf::from("papers"),
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            arxiv: ArxivConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Request path matches the messages endpoint, with or without trailing slash
    pub fn is_messages_path(&self, path: &str) -> bool {
        path == self.messages_path
            || path.trim_end_matches('/') == self.messages_path.trim_end_matches('/')
    }
}
