//! # Research Papers Server
//!
//! An MCP server that searches arXiv, keeps the metadata of every result in
//! per-topic `papers_info.json` files and extracts text from local PDFs.
//!
//! Clients connect over either transport on the same port:
//!
//! * Streamable HTTP at `/mcp` (JSON responses, `Mcp-Session-Id` header)
//! * legacy HTTP+SSE at `/sse` with messages posted to `/messages/`
//!
//! ```no_run
//! use research_papers_server::{ServerConfig, research_server};
//!
//! # async fn run() -> research_papers_server::Result<()> {
//! let server = research_server(ServerConfig::default())?;
//! server.run().await
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod cors;
pub mod handlers;
pub mod http;
pub mod prompt;
pub mod research;
pub mod resource;
pub mod server;
pub mod session;
pub mod sse;
pub mod tool;
pub mod uri_template;

use std::sync::Arc;

use research_papers_arxiv::{ArxivClient, ArxivError};
use research_papers_protocol::{Implementation, McpError};
use research_papers_store::PaperStore;
use thiserror::Error;

pub use config::ServerConfig;
pub use cors::CorsLayer;
pub use http::McpHttpHandler;
pub use prompt::McpPrompt;
pub use research::PaperSearch;
pub use resource::McpResource;
pub use server::{HttpMcpServer, HttpMcpServerBuilder};
pub use session::{Session, SessionManager, Transport};
pub use tool::McpTool;

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "research-papers";

const INSTRUCTIONS: &str = "Use search_papers to find arXiv papers on a topic, \
extract_info to read the stored details of a paper, and extract_text_paper to turn a \
local PDF into text. Stored topics are listed at papers://folders.";

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arXiv client error: {0}")]
    Arxiv(#[from] ArxivError),

    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// The research papers server, searching the live arXiv API
pub fn research_server(config: ServerConfig) -> Result<HttpMcpServer> {
    let client = ArxivClient::new(config.arxiv.clone())?;
    research_server_with_search(config, Arc::new(client))
}

/// The research papers server with a custom search backend
pub fn research_server_with_search(
    config: ServerConfig,
    search: Arc<dyn PaperSearch>,
) -> Result<HttpMcpServer> {
    let store = Arc::new(PaperStore::new(config.paper_dir.clone()));
    let max_search_results = config.max_search_results;

    HttpMcpServer::builder()
        .config(config)
        .server_info(Implementation::new(SERVER_NAME, env!("CARGO_PKG_VERSION")))
        .instructions(INSTRUCTIONS)
        .tools(research::research_tools(
            search,
            Arc::clone(&store),
            max_search_results,
        ))
        .resources(research::research_resources(store))
        .prompts(research::research_prompts())
        .build()
}
