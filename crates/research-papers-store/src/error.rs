use std::path::PathBuf;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File {0} does not exist")]
    NotFound(PathBuf),

    #[error("The file {path} appears to be corrupted or not a valid PDF: {reason}")]
    InvalidPdf { path: PathBuf, reason: String },

    /// Topic whose slug would escape the store root
    #[error("Invalid topic name '{0}'")]
    InvalidTopic(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
