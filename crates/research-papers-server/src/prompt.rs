//! MCP Prompt Trait

use std::collections::HashMap;

use async_trait::async_trait;
use research_papers_protocol::{McpError, McpResult, Prompt, PromptArgument, PromptMessage};

/// High-level trait for implementing MCP prompts
#[async_trait]
pub trait McpPrompt: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn arguments(&self) -> Vec<PromptArgument> {
        Vec::new()
    }

    /// Render the prompt with already validated arguments
    async fn render(&self, args: HashMap<String, String>) -> McpResult<Vec<PromptMessage>>;

    fn to_prompt(&self) -> Prompt {
        let arguments = self.arguments();
        Prompt {
            name: self.name().to_string(),
            title: None,
            description: self.description().map(str::to_string),
            arguments: (!arguments.is_empty()).then_some(arguments),
        }
    }

    /// Fail with a missing-parameter error for any absent required argument
    fn validate_args(&self, args: &HashMap<String, String>) -> McpResult<()> {
        for arg in self.arguments() {
            if arg.required.unwrap_or(false) && !args.contains_key(&arg.name) {
                return Err(McpError::missing_param(&arg.name));
            }
        }
        Ok(())
    }
}
