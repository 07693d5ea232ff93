//! Client configuration

use std::time::Duration;

/// Default arXiv query endpoint
pub const DEFAULT_BASE_URL: &str = "https://export.arxiv.org/api/query";

/// arXiv asks API users to wait three seconds between calls
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

pub const DEFAULT_PAGE_SIZE: usize = 100;

pub const DEFAULT_RETRIES: u32 = 3;

/// Settings for [`crate::ArxivClient`]
#[derive(Debug, Clone)]
pub struct ArxivConfig {
    pub base_url: String,
    /// Entries requested per page
    pub page_size: usize,
    /// Pause between consecutive requests, including retries
    pub delay: Duration,
    /// Extra attempts per page after the first failure
    pub retries: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            delay: DEFAULT_DELAY,
            retries: DEFAULT_RETRIES,
            timeout: Duration::from_secs(30),
            user_agent: format!("research-papers-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ArxivConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
