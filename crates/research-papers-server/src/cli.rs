//! Command line and environment options

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use research_papers_arxiv::ArxivConfig;
use research_papers_arxiv::config::DEFAULT_BASE_URL;

use crate::config::{DEFAULT_MAX_SEARCH_RESULTS, ServerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable, for terminals
    Pretty,
    /// One JSON object per line, for log collectors
    Json,
}

/// Serve arXiv search and a local paper library to MCP clients.
#[derive(Debug, Clone, Parser)]
#[command(name = "research-papers-server", version)]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on. Hosting platforms inject this through PORT.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory holding one sub-directory per search topic
    #[arg(long, env = "PAPER_DIR", default_value = "papers")]
    pub paper_dir: PathBuf,

    #[arg(long, default_value = "/mcp")]
    pub mcp_path: String,

    #[arg(long, default_value = "/sse")]
    pub sse_path: String,

    #[arg(long, default_value = "/messages/")]
    pub messages_path: String,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    pub max_body_size: usize,

    #[arg(long, default_value_t = 30)]
    pub session_expiry_minutes: u64,

    /// Do not send CORS headers
    #[arg(long)]
    pub no_cors: bool,

    #[arg(long, env = "ARXIV_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub arxiv_base_url: String,

    /// Pause between arXiv requests in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub arxiv_delay_ms: u64,

    #[arg(long, default_value_t = 100)]
    pub arxiv_page_size: usize,

    #[arg(long, default_value_t = 3)]
    pub arxiv_retries: u32,

    /// Largest max_results accepted by search_papers
    #[arg(long, default_value_t = DEFAULT_MAX_SEARCH_RESULTS)]
    pub max_search_results: usize,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_address: SocketAddr::new(self.host, self.port),
            mcp_path: self.mcp_path,
            sse_path: self.sse_path,
            messages_path: self.messages_path,
            enable_cors: !self.no_cors,
            max_body_size: self.max_body_size,
            session_expiry_minutes: self.session_expiry_minutes,
            paper_dir: self.paper_dir,
            max_search_results: self.max_search_results.max(1),
            arxiv: ArxivConfig::default()
                .with_base_url(self.arxiv_base_url)
                .with_delay(Duration::from_millis(self.arxiv_delay_ms))
                .with_page_size(self.arxiv_page_size)
                .with_retries(self.arxiv_retries),
            ..ServerConfig::default()
        }
    }
}
