//! # Paper store
//!
//! Persists arXiv search results as one `papers_info.json` per topic and
//! converts downloaded PDFs to plain text.

pub mod error;
pub mod paper;
pub mod pdf;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use paper::{PaperInfo, TOPIC_FILE_NAME, TopicPapers, topic_slug};
pub use pdf::extract_pdf_text;
pub use store::PaperStore;
