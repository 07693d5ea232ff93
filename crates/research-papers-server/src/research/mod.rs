//! The research papers tools, resources and prompt

pub mod prompts;
pub mod resources;
pub mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use research_papers_arxiv::{ArxivClient, ArxivEntry, ArxivResult, SearchQuery};
use research_papers_store::PaperStore;

use crate::prompt::McpPrompt;
use crate::resource::McpResource;
use crate::tool::McpTool;

pub use prompts::GenerateSearchPrompt;
pub use resources::{FoldersResource, TopicResource};
pub use tools::{ExtractInfoTool, ExtractTextPaperTool, SearchPapersTool};

/// Source of search results for `search_papers`
#[async_trait]
pub trait PaperSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> ArxivResult<Vec<ArxivEntry>>;
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &SearchQuery) -> ArxivResult<Vec<ArxivEntry>> {
        ArxivClient::search(self, query).await
    }
}

pub fn research_tools(
    search: Arc<dyn PaperSearch>,
    store: Arc<PaperStore>,
    max_search_results: usize,
) -> Vec<Arc<dyn McpTool>> {
    vec![
        Arc::new(SearchPapersTool::new(
            search,
            Arc::clone(&store),
            max_search_results,
        )),
        Arc::new(ExtractInfoTool::new(store)),
        Arc::new(ExtractTextPaperTool),
    ]
}

pub fn research_resources(store: Arc<PaperStore>) -> Vec<Arc<dyn McpResource>> {
    vec![
        Arc::new(FoldersResource::new(Arc::clone(&store))),
        Arc::new(TopicResource::new(store)),
    ]
}

pub fn research_prompts() -> Vec<Arc<dyn McpPrompt>> {
    vec![Arc::new(GenerateSearchPrompt)]
}
