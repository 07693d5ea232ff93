//! Atom feed parsing

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};

use crate::error::{ArxivError, ArxivResult};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const ARXIV_NS: &str = "http://arxiv.org/schemas/atom";
const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// One search result
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    /// Full abstract URL, e.g. `http://arxiv.org/abs/2101.00001v2`
    pub entry_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub pdf_url: Option<String>,
    pub primary_category: Option<String>,
    pub categories: Vec<String>,
    pub comment: Option<String>,
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
}

impl ArxivEntry {
    /// Id without the abstract URL prefix, e.g. `2101.00001v2`
    pub fn short_id(&self) -> &str {
        self.entry_id
            .rsplit_once("arxiv.org/abs/")
            .map_or(self.entry_id.as_str(), |(_, id)| id)
    }

    /// PDF link, falling back to the `/pdf/` form of the abstract URL
    pub fn pdf_link(&self) -> String {
        match &self.pdf_url {
            Some(url) => url.clone(),
            None => self.entry_id.replacen("/abs/", "/pdf/", 1),
        }
    }
}

/// A single page of results
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// `opensearch:totalResults`, the size of the whole result set
    pub total_results: usize,
    pub entries: Vec<ArxivEntry>,
}

pub fn parse_feed(xml: &str) -> ArxivResult<FeedPage> {
    let doc = Document::parse(xml)?;
    let feed = doc.root_element();
    if !feed.has_tag_name((ATOM_NS, "feed")) {
        return Err(ArxivError::Parse(format!(
            "expected Atom <feed> root, found <{}>",
            feed.tag_name().name()
        )));
    }

    let total_results = match child(feed, OPENSEARCH_NS, "totalResults") {
        Some(node) => text_of(node).trim().parse().map_err(|_| {
            ArxivError::Parse(format!("invalid totalResults '{}'", text_of(node)))
        })?,
        None => 0,
    };

    let entries = feed
        .children()
        .filter(|n| n.has_tag_name((ATOM_NS, "entry")))
        .map(parse_entry)
        .collect::<ArxivResult<Vec<_>>>()?;

    Ok(FeedPage {
        total_results,
        entries,
    })
}

fn parse_entry(entry: Node<'_, '_>) -> ArxivResult<ArxivEntry> {
    let entry_id = child(entry, ATOM_NS, "id")
        .map(|n| text_of(n).trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ArxivError::Parse("entry without <id>".to_string()))?;

    let authors = entry
        .children()
        .filter(|n| n.has_tag_name((ATOM_NS, "author")))
        .filter_map(|author| child(author, ATOM_NS, "name"))
        .map(|name| collapse_whitespace(text_of(name)))
        .collect();

    let pdf_url = entry
        .children()
        .filter(|n| n.has_tag_name((ATOM_NS, "link")))
        .find(|link| link.attribute("title") == Some("pdf"))
        .and_then(|link| link.attribute("href"))
        .map(str::to_string);

    let categories = entry
        .children()
        .filter(|n| n.has_tag_name((ATOM_NS, "category")))
        .filter_map(|n| n.attribute("term"))
        .map(str::to_string)
        .collect();

    Ok(ArxivEntry {
        title: collapse_whitespace(&child_text(entry, ATOM_NS, "title").unwrap_or_default()),
        summary: collapse_whitespace(&child_text(entry, ATOM_NS, "summary").unwrap_or_default()),
        published: timestamp(entry, "published")?,
        updated: timestamp(entry, "updated")?,
        authors,
        pdf_url,
        primary_category: child(entry, ARXIV_NS, "primary_category")
            .and_then(|n| n.attribute("term"))
            .map(str::to_string),
        categories,
        comment: child_text(entry, ARXIV_NS, "comment"),
        journal_ref: child_text(entry, ARXIV_NS, "journal_ref"),
        doi: child_text(entry, ARXIV_NS, "doi"),
        entry_id,
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((ns, name)))
}

fn text_of<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default()
}

fn child_text(node: Node<'_, '_>, ns: &str, name: &str) -> Option<String> {
    child(node, ns, name)
        .map(|n| text_of(n).trim().to_string())
        .filter(|s| !s.is_empty())
}

fn timestamp(entry: Node<'_, '_>, name: &str) -> ArxivResult<DateTime<Utc>> {
    let value = child_text(entry, ATOM_NS, name)
        .ok_or_else(|| ArxivError::Parse(format!("entry without <{name}>")))?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| ArxivError::Timestamp { value, source })
}

/// Collapse internal runs of whitespace (feed titles wrap across lines)
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
