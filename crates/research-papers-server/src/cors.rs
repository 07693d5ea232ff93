//! CORS (Cross-Origin Resource Sharing) support

use http::HeaderValue;
use hyper::HeaderMap;

/// CORS layer for adding appropriate headers
pub struct CorsLayer;

impl CorsLayer {
    /// Apply CORS headers to a response
    pub fn apply_cors_headers(headers: &mut HeaderMap) {
        headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
        headers.insert(
            "Access-Control-Allow-Methods",
            HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
        );
        headers.insert(
            "Access-Control-Allow-Headers",
            HeaderValue::from_static(
                "Content-Type, Accept, Authorization, Mcp-Session-Id, MCP-Protocol-Version",
            ),
        );
        // Browser clients need to read the session id assigned by initialize
        headers.insert(
            "Access-Control-Expose-Headers",
            HeaderValue::from_static("Mcp-Session-Id"),
        );
        headers.insert("Access-Control-Max-Age", HeaderValue::from_static("86400"));
    }
}
