//! `search_papers`, `extract_info` and `extract_text_paper`

use std::sync::Arc;

use async_trait::async_trait;
use research_papers_arxiv::{SearchQuery, SortCriterion};
use research_papers_protocol::{
    CallToolResult, JsonSchema, McpError, McpResult, SessionContext, Tool, ToolAnnotations,
    ToolSchema, extract_params,
};
use research_papers_store::{PaperInfo, PaperStore, StoreError, extract_pdf_text};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::PaperSearch;
use crate::tool::McpTool;

const DEFAULT_MAX_RESULTS: i64 = 5;

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Deserialize)]
struct SearchPapersArgs {
    topic: String,
    #[serde(default = "default_max_results")]
    max_results: i64,
}

/// Search arXiv and store the results under the topic directory
pub struct SearchPapersTool {
    search: Arc<dyn PaperSearch>,
    store: Arc<PaperStore>,
    max_results: usize,
}

impl SearchPapersTool {
    pub fn new(search: Arc<dyn PaperSearch>, store: Arc<PaperStore>, max_results: usize) -> Self {
        Self {
            search,
            store,
            max_results: max_results.max(1),
        }
    }
}

#[async_trait]
impl McpTool for SearchPapersTool {
    fn name(&self) -> &str {
        "search_papers"
    }

    fn to_tool(&self) -> Tool {
        Tool {
            name: self.name().to_string(),
            title: Some("Search arXiv papers".to_string()),
            description: Some(
                "Search for papers on arXiv based on a topic and store their information. \
                 Returns the list of paper IDs found."
                    .to_string(),
            ),
            input_schema: ToolSchema::object()
                .with_property(
                    "topic",
                    JsonSchema::string().with_description("The topic to search for"),
                )
                .with_property(
                    "max_results",
                    JsonSchema::integer()
                        .with_description("Maximum number of results to retrieve")
                        .with_default(json!(DEFAULT_MAX_RESULTS))
                        .with_range(1, self.max_results as i64),
                )
                .with_required(vec!["topic".to_string()]),
            output_schema: Some(
                ToolSchema::object()
                    .with_property("paper_ids", JsonSchema::array(JsonSchema::string()))
                    .with_required(vec!["paper_ids".to_string()]),
            ),
            annotations: Some(
                ToolAnnotations::new()
                    .with_read_only_hint(false)
                    .with_destructive_hint(false)
                    .with_idempotent_hint(true)
                    .with_open_world_hint(true),
            ),
        }
    }

    async fn call(
        &self,
        args: Value,
        _session: Option<SessionContext>,
    ) -> McpResult<CallToolResult> {
        let args: SearchPapersArgs = extract_params(Some(args))?;

        let topic = args.topic.as_str();
        if topic.trim().is_empty() {
            return Err(McpError::InvalidParameters(
                "topic must not be empty".to_string(),
            ));
        }
        if args.max_results < 1 || args.max_results > self.max_results as i64 {
            return Err(McpError::param_out_of_range(
                "max_results",
                &args.max_results.to_string(),
                &format!("must be between 1 and {}", self.max_results),
            ));
        }
        // Reject topics that cannot become a directory before querying arXiv
        self.store
            .topic_dir(topic)
            .map_err(|e| McpError::InvalidParameters(e.to_string()))?;

        let query = SearchQuery::new(topic)
            .with_max_results(args.max_results as usize)
            .with_sort_by(SortCriterion::Relevance);
        let entries = self
            .search
            .search(&query)
            .await
            .map_err(|e| McpError::tool_execution(&format!("arXiv search failed: {}", e)))?;

        let paper_ids: Vec<String> = entries.iter().map(|e| e.short_id().to_string()).collect();
        let papers = entries
            .iter()
            .map(|entry| (entry.short_id().to_string(), PaperInfo::from(entry)));
        self.store
            .merge_topic(topic, papers)
            .await
            .map_err(|e| McpError::tool_execution(&e.to_string()))?;

        info!("search_papers '{}' returned {} papers", topic, paper_ids.len());
        Ok(
            CallToolResult::from_text(serde_json::to_string(&paper_ids)?)
                .with_structured(json!({ "paper_ids": paper_ids })),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ExtractInfoArgs {
    paper_id: String,
}

/// Look up stored metadata for a paper across all topics
pub struct ExtractInfoTool {
    store: Arc<PaperStore>,
}

impl ExtractInfoTool {
    pub fn new(store: Arc<PaperStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl McpTool for ExtractInfoTool {
    fn name(&self) -> &str {
        "extract_info"
    }

    fn to_tool(&self) -> Tool {
        Tool {
            name: self.name().to_string(),
            title: Some("Stored paper information".to_string()),
            description: Some(
                "Search for information about a specific paper across all topic directories."
                    .to_string(),
            ),
            input_schema: ToolSchema::object()
                .with_property(
                    "paper_id",
                    JsonSchema::string().with_description("The ID of the paper to look for"),
                )
                .with_required(vec!["paper_id".to_string()]),
            output_schema: None,
            annotations: Some(
                ToolAnnotations::new()
                    .with_read_only_hint(true)
                    .with_open_world_hint(false),
            ),
        }
    }

    async fn call(
        &self,
        args: Value,
        _session: Option<SessionContext>,
    ) -> McpResult<CallToolResult> {
        let args: ExtractInfoArgs = extract_params(Some(args))?;

        let found = self
            .store
            .find_paper(&args.paper_id)
            .await
            .map_err(|e| McpError::tool_execution(&e.to_string()))?;

        let text = match found {
            Some(info) => serde_json::to_string_pretty(&info)?,
            None => format!(
                "There's no saved information related to paper {}.",
                args.paper_id
            ),
        };
        Ok(CallToolResult::from_text(text))
    }
}

#[derive(Debug, Deserialize)]
struct ExtractTextPaperArgs {
    paper_path: String,
}

/// Write the text of a local PDF to a sibling `.txt` file
pub struct ExtractTextPaperTool;

#[async_trait]
impl McpTool for ExtractTextPaperTool {
    fn name(&self) -> &str {
        "extract_text_paper"
    }

    fn to_tool(&self) -> Tool {
        Tool {
            name: self.name().to_string(),
            title: Some("Extract PDF text".to_string()),
            description: Some(
                "Extract text content from a PDF file and save it as a text file. \
                 Returns the path of the text file."
                    .to_string(),
            ),
            input_schema: ToolSchema::object()
                .with_property(
                    "paper_path",
                    JsonSchema::string()
                        .with_description("Path to the PDF file to extract text from"),
                )
                .with_required(vec!["paper_path".to_string()]),
            output_schema: None,
            annotations: Some(
                ToolAnnotations::new()
                    .with_read_only_hint(false)
                    .with_destructive_hint(false)
                    .with_idempotent_hint(true)
                    .with_open_world_hint(false),
            ),
        }
    }

    async fn call(
        &self,
        args: Value,
        _session: Option<SessionContext>,
    ) -> McpResult<CallToolResult> {
        let args: ExtractTextPaperArgs = extract_params(Some(args))?;

        match extract_pdf_text(&args.paper_path).await {
            Ok(output) => Ok(CallToolResult::from_text(output.display().to_string())),
            Err(e @ (StoreError::NotFound(_) | StoreError::InvalidPdf { .. })) => {
                warn!("extract_text_paper failed: {}", e);
                Ok(CallToolResult::error_text(format!("Error: {}", e)))
            }
            Err(e) => Err(McpError::tool_execution(&e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::testing::{FakeSearch, entry};
    use research_papers_store::TOPIC_FILE_NAME;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> Arc<PaperStore> {
        Arc::new(PaperStore::new(tmp.path()))
    }

    #[tokio::test]
    async fn test_search_papers_stores_results() {
        let tmp = TempDir::new().unwrap();
        let search = Arc::new(FakeSearch::with_entries(vec![
            entry("2101.00001v2", "First"),
            entry("2101.00002v1", "Second"),
        ]));
        let tool = SearchPapersTool::new(search.clone(), store(&tmp), 100);

        let result = tool
            .call(json!({"topic": "Machine Learning", "max_results": 2}), None)
            .await
            .unwrap();
        assert!(!result.is_error());
        assert_eq!(result.text(), r#"["2101.00001v2","2101.00002v1"]"#);
        assert_eq!(
            result.structured_content,
            Some(json!({"paper_ids": ["2101.00001v2", "2101.00002v1"]}))
        );

        let query = search.queries.lock().unwrap()[0].clone();
        assert_eq!(query.query, "Machine Learning");
        assert_eq!(query.max_results, 2);
        assert_eq!(query.sort_by, SortCriterion::Relevance);

        let file = tmp.path().join("machine_learning").join(TOPIC_FILE_NAME);
        let stored: Value =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(stored["2101.00001v2"]["title"], "First");
        assert_eq!(stored["2101.00002v1"]["published"], "2024-03-01");
    }

    #[tokio::test]
    async fn test_search_papers_keeps_surrounding_spaces() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let search = Arc::new(FakeSearch::with_entries(vec![entry("2101.00001v2", "First")]));
        let tool = SearchPapersTool::new(search.clone(), Arc::clone(&store), 100);

        tool.call(json!({"topic": " LLM agents "}), None).await.unwrap();

        assert_eq!(search.queries.lock().unwrap()[0].query, " LLM agents ");
        assert_eq!(store.list_topics().await.unwrap(), vec!["_llm_agents_"]);
        assert!(tmp.path().join("_llm_agents_").join(TOPIC_FILE_NAME).is_file());
    }

    #[tokio::test]
    async fn test_search_papers_default_max_results() {
        let tmp = TempDir::new().unwrap();
        let search = Arc::new(FakeSearch::default());
        let tool = SearchPapersTool::new(search.clone(), store(&tmp), 100);

        let result = tool.call(json!({"topic": "graphs"}), None).await.unwrap();
        assert_eq!(result.text(), "[]");
        assert_eq!(search.queries.lock().unwrap()[0].max_results, 5);
    }

    #[tokio::test]
    async fn test_search_papers_rejects_bad_arguments() {
        let tmp = TempDir::new().unwrap();
        let tool = SearchPapersTool::new(Arc::new(FakeSearch::default()), store(&tmp), 50);

        for args in [
            json!({"topic": "  "}),
            json!({}),
            json!({"topic": "x", "max_results": 0}),
            json!({"topic": "x", "max_results": 51}),
            json!({"topic": "x", "max_results": "many"}),
            json!({"topic": ".."}),
        ] {
            let err = tool.call(args.clone(), None).await.unwrap_err();
            assert_eq!(
                err.to_error_object().code,
                research_papers_protocol::json_rpc::error_codes::INVALID_PARAMS,
                "{args}"
            );
        }
    }

    #[tokio::test]
    async fn test_extract_info() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let search = Arc::new(FakeSearch::with_entries(vec![entry("1234.5678v1", "Stored")]));
        SearchPapersTool::new(search, Arc::clone(&store), 10)
            .call(json!({"topic": "physics"}), None)
            .await
            .unwrap();

        let tool = ExtractInfoTool::new(store);
        let found = tool
            .call(json!({"paper_id": "1234.5678v1"}), None)
            .await
            .unwrap();
        let info: PaperInfo = serde_json::from_str(&found.text()).unwrap();
        assert_eq!(info.title, "Stored");
        assert!(found.text().contains("\n  \"title\""));

        let missing = tool.call(json!({"paper_id": "0000.0000"}), None).await.unwrap();
        assert_eq!(
            missing.text(),
            "There's no saved information related to paper 0000.0000."
        );
    }

    #[tokio::test]
    async fn test_extract_text_paper_missing_file_is_tool_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.pdf");

        let result = ExtractTextPaperTool
            .call(json!({"paper_path": path.display().to_string()}), None)
            .await
            .unwrap();
        assert!(result.is_error());
        assert!(result.text().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_extract_text_paper_invalid_pdf_is_tool_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("junk.pdf");
        std::fs::write(&path, "not a pdf").unwrap();

        let result = ExtractTextPaperTool
            .call(json!({"paper_path": path.display().to_string()}), None)
            .await
            .unwrap();
        assert!(result.is_error());
        assert!(result.text().contains("not a valid PDF"));
    }

    #[test]
    fn test_descriptors() {
        let tmp = TempDir::new().unwrap();
        let tool = SearchPapersTool::new(Arc::new(FakeSearch::default()), store(&tmp), 100);
        let descriptor = serde_json::to_value(tool.to_tool()).unwrap();
        assert_eq!(descriptor["inputSchema"]["required"], json!(["topic"]));
        assert_eq!(
            descriptor["inputSchema"]["properties"]["max_results"]["default"],
            json!(5)
        );
        assert!(descriptor["outputSchema"]["properties"]["paper_ids"].is_object());
    }
}
