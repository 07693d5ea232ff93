//! Search parameters and request URL construction

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ArxivResult;

/// Ordering criterion understood by the API's `sortBy` parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortCriterion {
    #[default]
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortCriterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortCriterion::Relevance => "relevance",
            SortCriterion::LastUpdatedDate => "lastUpdatedDate",
            SortCriterion::SubmittedDate => "submittedDate",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search against the arXiv query API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text or fielded query (`ti:`, `au:`, `cat:` ...)
    pub query: String,
    pub id_list: Vec<String>,
    /// Total number of entries wanted across all pages
    pub max_results: usize,
    pub sort_by: SortCriterion,
    pub sort_order: SortOrder,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            id_list: Vec::new(),
            max_results: 10,
            sort_by: SortCriterion::Relevance,
            sort_order: SortOrder::Descending,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_sort_by(mut self, sort_by: SortCriterion) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_id_list(mut self, ids: Vec<String>) -> Self {
        self.id_list = ids;
        self
    }

    /// URL of the page starting at `start` holding at most `page_size` entries
    pub fn page_url(&self, base_url: &str, start: usize, page_size: usize) -> ArxivResult<Url> {
        let url = Url::parse_with_params(
            base_url,
            &[
                ("search_query", self.query.clone()),
                ("id_list", self.id_list.join(",")),
                ("sortBy", self.sort_by.to_string()),
                ("sortOrder", self.sort_order.to_string()),
                ("start", start.to_string()),
                ("max_results", page_size.to_string()),
            ],
        )?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_encodes_query_and_paging() {
        let query = SearchQuery::new("quantum computing").with_max_results(5);
        let url = query
            .page_url("https://export.arxiv.org/api/query", 100, 5)
            .unwrap();

        assert_eq!(url.host_str(), Some("export.arxiv.org"));
        assert_eq!(url.path(), "/api/query");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("search_query".into(), "quantum computing".into()),
                ("id_list".into(), "".into()),
                ("sortBy".into(), "relevance".into()),
                ("sortOrder".into(), "descending".into()),
                ("start".into(), "100".into()),
                ("max_results".into(), "5".into()),
            ]
        );
        assert!(url.as_str().contains("search_query=quantum+computing"));
    }

    #[test]
    fn test_id_list_is_comma_joined() {
        let query = SearchQuery::new("")
            .with_id_list(vec!["2101.00001".into(), "1706.03762v7".into()])
            .with_sort_by(SortCriterion::SubmittedDate)
            .with_sort_order(SortOrder::Ascending);
        let url = query.page_url("http://localhost/api", 0, 2).unwrap();
        assert!(url.as_str().contains("id_list=2101.00001%2C1706.03762v7"));
        assert!(url.as_str().contains("sortBy=submittedDate"));
        assert!(url.as_str().contains("sortOrder=ascending"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(SearchQuery::new("x").page_url("not a url", 0, 1).is_err());
    }
}
