//! Markdown views of the paper store

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use research_papers_protocol::{McpError, McpResult, ResourceContents};
use research_papers_store::{PaperStore, StoreError, TopicPapers};

use crate::resource::McpResource;

const SUMMARY_PREVIEW_CHARS: usize = 500;

/// `papers://folders`: the topics that have stored papers
pub struct FoldersResource {
    store: Arc<PaperStore>,
}

impl FoldersResource {
    pub fn new(store: Arc<PaperStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl McpResource for FoldersResource {
    fn uri(&self) -> &str {
        "papers://folders"
    }

    fn name(&self) -> &str {
        "folders"
    }

    fn description(&self) -> Option<&str> {
        Some("List all available topic folders in the papers directory")
    }

    async fn read(
        &self,
        uri: &str,
        _variables: HashMap<String, String>,
    ) -> McpResult<Vec<ResourceContents>> {
        let topics = self
            .store
            .list_topics()
            .await
            .map_err(|e| McpError::resource_execution(&e.to_string()))?;
        Ok(vec![ResourceContents::markdown(uri, render_folders(&topics))])
    }
}

fn render_folders(topics: &[String]) -> String {
    if topics.is_empty() {
        return "# Available Topics\n\nNo topics found.".to_string();
    }
    let mut content = String::from("# Available Topics\n\n");
    for topic in topics {
        let _ = writeln!(content, "- {}", topic);
    }
    content.push_str("\nUse @topic to access papers in that topic.");
    content
}

/// `papers://{topic}`: every stored paper of one topic
pub struct TopicResource {
    store: Arc<PaperStore>,
}

impl TopicResource {
    pub fn new(store: Arc<PaperStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl McpResource for TopicResource {
    fn uri(&self) -> &str {
        "papers://{topic}"
    }

    fn name(&self) -> &str {
        "topic_papers"
    }

    fn description(&self) -> Option<&str> {
        Some("Detailed information about the papers stored for a topic")
    }

    async fn read(
        &self,
        uri: &str,
        variables: HashMap<String, String>,
    ) -> McpResult<Vec<ResourceContents>> {
        let topic = variables
            .get("topic")
            .ok_or_else(|| McpError::missing_param("topic"))?;

        let papers = match self.store.load_topic(topic).await {
            Ok(papers) => papers,
            Err(e @ StoreError::InvalidTopic(_)) => {
                return Err(McpError::InvalidParameters(e.to_string()));
            }
            Err(e) => return Err(McpError::resource_execution(&e.to_string())),
        };
        Ok(vec![ResourceContents::markdown(
            uri,
            render_topic(topic, &papers),
        )])
    }
}

fn render_topic(topic: &str, papers: &TopicPapers) -> String {
    if papers.is_empty() {
        return format!(
            "# No papers found for topic: {}\n\nTry searching for papers on this topic first.",
            topic
        );
    }

    let mut content = format!("# Papers on {}\n\n", display_topic(topic));
    let _ = writeln!(content, "Total papers: {}\n", papers.len());

    for (paper_id, info) in papers {
        let _ = writeln!(content, "## {}", info.title);
        let _ = writeln!(content, "- **Paper ID**: {}", paper_id);
        let _ = writeln!(content, "- **Authors**: {}", info.authors.join(", "));
        let _ = writeln!(content, "- **Published**: {}", info.published);
        let _ = writeln!(content, "- **PDF URL**: [{}]({})\n", info.pdf_url, info.pdf_url);
        let _ = writeln!(content, "### Summary\n{}\n", preview(&info.summary));
        content.push_str("---\n\n");
    }
    content
}

/// `machine_learning` -> `Machine Learning`
fn display_topic(topic: &str) -> String {
    topic
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn preview(summary: &str) -> String {
    if summary.chars().count() <= SUMMARY_PREVIEW_CHARS {
        return summary.to_string();
    }
    let mut short: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}
