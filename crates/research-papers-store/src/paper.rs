//! Persisted paper metadata

use std::collections::BTreeMap;

use research_papers_arxiv::ArxivEntry;
use serde::{Deserialize, Serialize};

/// File name of the per-topic metadata file
pub const TOPIC_FILE_NAME: &str = "papers_info.json";

/// Metadata kept for each paper found by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub pdf_url: String,
    /// Publication date as `YYYY-MM-DD`
    pub published: String,
}

impl From<&ArxivEntry> for PaperInfo {
    fn from(entry: &ArxivEntry) -> Self {
        Self {
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            summary: entry.summary.clone(),
            pdf_url: entry.pdf_link(),
            published: entry.published.date_naive().to_string(),
        }
    }
}

/// Contents of one topic file, keyed by short paper id
pub type TopicPapers = BTreeMap<String, PaperInfo>;

/// Directory name for a topic: lowercased, spaces replaced by underscores
pub fn topic_slug(topic: &str) -> String {
    topic.to_lowercase().replace(' ', "_")
}
