//! Topic directories holding `papers_info.json` files

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::paper::{PaperInfo, TOPIC_FILE_NAME, TopicPapers, topic_slug};

/// Paper metadata on disk, one directory per search topic
///
/// ```text
/// <root>/
///   quantum_computing/papers_info.json
///   llm_agents/papers_info.json
/// ```
#[derive(Debug)]
pub struct PaperStore {
    root: PathBuf,
    // Serialises load-merge-write so concurrent searches keep each other's entries
    write_lock: Mutex<()>,
}

impl PaperStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn topic_dir(&self, topic: &str) -> StoreResult<PathBuf> {
        let slug = topic_slug(topic);
        if slug.is_empty()
            || slug == "."
            || slug == ".."
            || slug.contains('/')
            || slug.contains('\\')
        {
            return Err(StoreError::InvalidTopic(topic.to_string()));
        }
        Ok(self.root.join(slug))
    }

    pub fn topic_file(&self, topic: &str) -> StoreResult<PathBuf> {
        Ok(self.topic_dir(topic)?.join(TOPIC_FILE_NAME))
    }

    /// Stored papers for a topic. A missing or unparsable file reads as empty.
    pub async fn load_topic(&self, topic: &str) -> StoreResult<TopicPapers> {
        let path = self.topic_file(topic)?;
        read_topic_file(&path).await
    }

    /// Merge `papers` into the topic file, creating it if needed.
    ///
    /// Existing entries with other ids are kept; entries with the same id are
    /// replaced. Returns the path of the written file.
    pub async fn merge_topic(
        &self,
        topic: &str,
        papers: impl IntoIterator<Item = (String, PaperInfo)>,
    ) -> StoreResult<PathBuf> {
        let dir = self.topic_dir(topic)?;
        let path = dir.join(TOPIC_FILE_NAME);

        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let mut stored = read_topic_file(&path).await?;
        stored.extend(papers);

        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, json)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        info!("Results are saved in: {}", path.display());
        Ok(path)
    }

    /// Look a paper up across all topics, in sorted topic order
    pub async fn find_paper(&self, paper_id: &str) -> StoreResult<Option<PaperInfo>> {
        for dir in self.topic_dirs().await? {
            let path = dir.join(TOPIC_FILE_NAME);
            if !is_file(&path).await {
                continue;
            }

            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) => {
                    warn!("Error reading {}: {}", path.display(), e);
                    continue;
                }
            };
            let mut papers: TopicPapers = match serde_json::from_str(&contents) {
                Ok(papers) => papers,
                Err(e) => {
                    warn!("Error reading {}: {}", path.display(), e);
                    continue;
                }
            };

            if let Some(info) = papers.remove(paper_id) {
                debug!("Found {} in {}", paper_id, path.display());
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    /// Sorted names of topic directories that hold a topic file
    pub async fn list_topics(&self) -> StoreResult<Vec<String>> {
        let mut topics = Vec::new();
        for dir in self.topic_dirs().await? {
            if !is_file(&dir.join(TOPIC_FILE_NAME)).await {
                continue;
            }
            if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
                topics.push(name.to_string());
            }
        }
        Ok(topics)
    }

    async fn topic_dirs(&self) -> StoreResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let path = entry.path();
            if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

async fn read_topic_file(path: &Path) -> StoreResult<TopicPapers> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TopicPapers::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    match serde_json::from_str(&contents) {
        Ok(papers) => Ok(papers),
        Err(e) => {
            warn!("Ignoring unreadable topic file {}: {}", path.display(), e);
            Ok(TopicPapers::new())
        }
    }
}
