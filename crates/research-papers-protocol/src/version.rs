//! MCP protocol versions
//!
//! - **2024-11-05**: HTTP+SSE transport
//! - **2025-03-26**: Streamable HTTP, tool annotations
//! - **2025-06-18**: structured tool output, `title` fields

use serde::{Deserialize, Serialize};

/// Supported MCP protocol versions, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum McpVersion {
    #[serde(rename = "2024-11-05")]
    V2024_11_05,
    #[serde(rename = "2025-03-26")]
    V2025_03_26,
    #[serde(rename = "2025-06-18")]
    V2025_06_18,
}

impl McpVersion {
    pub const SUPPORTED: [McpVersion; 3] = [
        McpVersion::V2024_11_05,
        McpVersion::V2025_03_26,
        McpVersion::V2025_06_18,
    ];

    /// The latest protocol version this server implements
    pub const LATEST: McpVersion = McpVersion::V2025_06_18;

    pub fn parse(s: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|v| v.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            McpVersion::V2024_11_05 => "2024-11-05",
            McpVersion::V2025_03_26 => "2025-03-26",
            McpVersion::V2025_06_18 => "2025-06-18",
        }
    }

    /// Pick the version to answer an `initialize` with.
    ///
    /// A supported client version is echoed back; anything else gets the
    /// latest version and the client decides whether it can continue.
    pub fn negotiate(client_version: &str) -> Self {
        Self::parse(client_version).unwrap_or(Self::LATEST)
    }

    pub fn supports_streamable_http(&self) -> bool {
        *self >= McpVersion::V2025_03_26
    }

    pub fn supports_structured_content(&self) -> bool {
        *self >= McpVersion::V2025_06_18
    }
}

impl Default for McpVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl std::fmt::Display for McpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
