//! URI templates for dynamic resources
//!
//! Supports simple `{name}` expressions (RFC 6570 level 1), e.g. `papers://{topic}`.
//! A variable matches one non-empty path segment.

use std::collections::HashMap;

use regex::Regex;
use research_papers_protocol::{McpError, McpResult};

/// A compiled URI template
#[derive(Debug, Clone)]
pub struct UriTemplate {
    pattern: String,
    regex: Regex,
    variables: Vec<String>,
}

impl UriTemplate {
    pub fn new(pattern: &str) -> McpResult<Self> {
        let mut regex_pattern = String::from("^");
        let mut variables = Vec::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            let close = rest[open..].find('}').map(|i| open + i).ok_or_else(|| {
                McpError::InvalidParameters(format!("Unclosed expression in template {}", pattern))
            })?;
            let name = &rest[open + 1..close];
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(McpError::InvalidParameters(format!(
                    "Invalid variable '{}' in template {}",
                    name, pattern
                )));
            }
            regex_pattern.push_str(&regex::escape(&rest[..open]));
            regex_pattern.push_str("([^/]+)");
            variables.push(name.to_string());
            rest = &rest[close + 1..];
        }
        regex_pattern.push_str(&regex::escape(rest));
        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern).map_err(|e| {
            McpError::InvalidParameters(format!("Failed to compile template {}: {}", pattern, e))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            variables,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn matches(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }

    /// Variable values for `uri`, or `None` when it does not match
    pub fn extract(&self, uri: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(uri)?;
        let mut values = HashMap::new();
        for (i, name) in self.variables.iter().enumerate() {
            let value = captures.get(i + 1)?.as_str();
            values.insert(name.clone(), percent_decode(value));
        }
        Some(values)
    }
}

/// Decode `%XX` escapes; malformed escapes are kept as-is
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
