//! Error types for arXiv API access

use thiserror::Error;

/// Result type for arXiv operations
pub type ArxivResult<T> = Result<T, ArxivError>;

#[derive(Error, Debug)]
pub enum ArxivError {
    /// Connection, timeout or body read failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("arXiv returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed Atom feed: {0}")]
    Parse(String),

    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The first page came back empty although the feed reports results
    #[error("Unexpected empty page at offset {start} of {url}")]
    EmptyPage { url: String, start: usize },

    #[error("Invalid query URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ArxivError {
    /// Whether another attempt at the same page may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ArxivError::Http(_) | ArxivError::EmptyPage { .. } => true,
            ArxivError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<roxmltree::Error> for ArxivError {
    fn from(err: roxmltree::Error) -> Self {
        ArxivError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let server = ArxivError::Status {
            status: 503,
            url: "u".into(),
        };
        let client = ArxivError::Status {
            status: 400,
            url: "u".into(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!ArxivError::Parse("x".into()).is_transient());
        assert!(
            ArxivError::EmptyPage {
                url: "u".into(),
                start: 0
            }
            .is_transient()
        );
    }
}
