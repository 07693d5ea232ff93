//! # arXiv client
//!
//! Queries the public arXiv Atom API (`export.arxiv.org/api/query`), following
//! its usage guidance: paged requests, a pause between calls and bounded
//! retries for transient failures.
//!
//! ```no_run
//! use research_papers_arxiv::{ArxivClient, ArxivConfig, SearchQuery};
//!
//! # async fn run() -> research_papers_arxiv::ArxivResult<()> {
//! let client = ArxivClient::new(ArxivConfig::default())?;
//! let entries = client
//!     .search(&SearchQuery::new("quantum error correction").with_max_results(5))
//!     .await?;
//! for entry in entries {
//!     println!("{} {}", entry.short_id(), entry.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod query;

pub use client::ArxivClient;
pub use config::ArxivConfig;
pub use error::{ArxivError, ArxivResult};
pub use feed::{ArxivEntry, FeedPage, parse_feed};
pub use query::{SearchQuery, SortCriterion, SortOrder};
