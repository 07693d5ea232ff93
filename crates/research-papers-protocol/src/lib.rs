//! # Research Papers Protocol
//!
//! JSON-RPC 2.0 framing and the subset of the Model Context Protocol spoken by
//! the research papers server: lifecycle, tools, resources, prompts and
//! logging level control.
//!
//! Versions 2024-11-05, 2025-03-26 and 2025-06-18 are accepted during
//! `initialize`; anything else negotiates down to the latest.

pub mod dispatch;
pub mod initialize;
pub mod json_rpc;
pub mod logging;
pub mod prompts;
pub mod resources;
pub mod schema;
pub mod tools;
pub mod version;

pub use dispatch::{JsonRpcDispatcher, JsonRpcHandler, SessionContext, ToJsonRpcError};
pub use initialize::{
    ClientCapabilities, Implementation, InitializeRequest, InitializeResult, ServerCapabilities,
};
pub use json_rpc::{
    IncomingMessage, JsonRpcError, JsonRpcErrorObject, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId,
};
pub use logging::{LoggingLevel, SetLevelParams};
pub use prompts::{
    GetPromptParams, GetPromptResult, ListPromptsResult, Prompt, PromptArgument, PromptMessage,
    Role,
};
pub use resources::{
    ListResourceTemplatesResult, ListResourcesResult, ReadResourceParams, ReadResourceResult,
    Resource, ResourceContents, ResourceTemplate,
};
pub use schema::{JsonSchema, ToolSchema};
pub use tools::{
    CallToolParams, CallToolResult, ContentBlock, ListToolsResult, Tool, ToolAnnotations,
};
pub use version::McpVersion;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Common result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

/// MCP-specific errors
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter '{param}' value {value} is out of range: {constraint}")]
    ParameterOutOfRange {
        param: String,
        value: String,
        constraint: String,
    },

    #[error("Tool execution failed: {0}")]
    ToolExecutionError(String),

    #[error("Resource execution failed: {0}")]
    ResourceExecutionError(String),

    #[error("Prompt execution failed: {0}")]
    PromptExecutionError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl McpError {
    pub fn missing_param(param: &str) -> Self {
        Self::MissingParameter(param.to_string())
    }

    pub fn param_out_of_range(param: &str, value: &str, constraint: &str) -> Self {
        Self::ParameterOutOfRange {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    pub fn tool_execution(message: &str) -> Self {
        Self::ToolExecutionError(message.to_string())
    }

    pub fn resource_execution(message: &str) -> Self {
        Self::ResourceExecutionError(message.to_string())
    }

    pub fn prompt_execution(message: &str) -> Self {
        Self::PromptExecutionError(message.to_string())
    }

    /// Convert to a JSON-RPC error object
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            McpError::InvalidParameters(msg) => JsonRpcErrorObject::invalid_params(msg),
            McpError::MissingParameter(_) | McpError::ParameterOutOfRange { .. } => {
                JsonRpcErrorObject::invalid_params(&self.to_string())
            }

            McpError::ToolNotFound(_) => {
                JsonRpcErrorObject::server_error(-32001, &self.to_string())
            }
            McpError::ResourceNotFound(_) => {
                JsonRpcErrorObject::server_error(-32002, &self.to_string())
            }
            McpError::PromptNotFound(_) => {
                JsonRpcErrorObject::server_error(-32003, &self.to_string())
            }

            McpError::ToolExecutionError(_) => {
                JsonRpcErrorObject::server_error(-32010, &self.to_string())
            }
            McpError::ResourceExecutionError(_) => {
                JsonRpcErrorObject::server_error(-32012, &self.to_string())
            }
            McpError::PromptExecutionError(_) => {
                JsonRpcErrorObject::server_error(-32013, &self.to_string())
            }

            McpError::SessionError(_) => {
                JsonRpcErrorObject::server_error(-32031, &self.to_string())
            }

            McpError::IoError(_) | McpError::SerializationError(_) => {
                JsonRpcErrorObject::internal_error(Some(self.to_string()))
            }
        }
    }
}

impl ToJsonRpcError for McpError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        McpError::to_error_object(self)
    }
}

/// Deserialize method params, treating absent params as an empty object
pub fn extract_params<T: DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let value = match params {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(|e| McpError::InvalidParameters(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_rpc::error_codes;
    use serde_json::json;

    #[test]
    fn test_parameter_errors_are_invalid_params() {
        let obj = McpError::missing_param("topic").to_error_object();
        assert_eq!(obj.code, error_codes::INVALID_PARAMS);
        assert_eq!(obj.message, "Missing required parameter: topic");

        let obj = McpError::param_out_of_range("max_results", "0", "must be between 1 and 50")
            .to_error_object();
        assert_eq!(obj.code, error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_not_found_codes() {
        assert_eq!(
            McpError::ToolNotFound("x".into()).to_error_object().code,
            -32001
        );
        assert_eq!(
            McpError::ResourceNotFound("papers://x".into())
                .to_error_object()
                .code,
            -32002
        );
        assert_eq!(
            McpError::PromptNotFound("p".into()).to_error_object().code,
            -32003
        );
    }

    #[test]
    fn test_extract_params_defaults_to_empty_object() {
        #[derive(serde::Deserialize)]
        struct Params {
            #[serde(default)]
            cursor: Option<String>,
        }
        let params: Params = extract_params(None).unwrap();
        assert!(params.cursor.is_none());

        let err = extract_params::<ReadResourceParams>(Some(json!({}))).unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters(_)));
    }
}
