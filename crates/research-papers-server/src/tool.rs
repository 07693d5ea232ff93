//! MCP Tool Trait

use async_trait::async_trait;
use research_papers_protocol::{CallToolResult, McpResult, SessionContext, Tool};
use serde_json::Value;

/// High-level trait for implementing MCP tools
#[async_trait]
pub trait McpTool: Send + Sync {
    fn name(&self) -> &str;

    /// Descriptor advertised by `tools/list`
    fn to_tool(&self) -> Tool;

    /// Execute the tool.
    ///
    /// Parameter errors surface as JSON-RPC errors, any other error is
    /// reported to the client as an `isError` result.
    async fn call(&self, args: Value, session: Option<SessionContext>)
    -> McpResult<CallToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_papers_protocol::{JsonSchema, McpError, ToolSchema};

    struct EchoTool;

    #[async_trait]
    impl McpTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn to_tool(&self) -> Tool {
            Tool {
                name: self.name().to_string(),
                title: None,
                description: Some("Echo a message".to_string()),
                input_schema: ToolSchema::object()
                    .with_property("message", JsonSchema::string())
                    .with_required(vec!["message".to_string()]),
                output_schema: None,
                annotations: None,
            }
        }

        async fn call(
            &self,
            args: Value,
            _session: Option<SessionContext>,
        ) -> McpResult<CallToolResult> {
            let message = args
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| McpError::missing_param("message"))?;
            Ok(CallToolResult::from_text(message))
        }
    }

    #[tokio::test]
    async fn test_tool_as_trait_object() {
        let tool: Box<dyn McpTool> = Box::new(EchoTool);
        assert_eq!(tool.to_tool().name, "echo");

        let result = tool
            .call(serde_json::json!({"message": "hi"}), None)
            .await
            .unwrap();
        assert_eq!(result.text(), "hi");

        let err = tool.call(serde_json::json!({}), None).await.unwrap_err();
        assert!(matches!(err, McpError::MissingParameter(_)));
    }
}
