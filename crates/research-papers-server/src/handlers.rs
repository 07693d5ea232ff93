//! JSON-RPC method handlers
//!
//! Each handler serves one area of the protocol and reports the methods it
//! owns through `supported_methods`, so the dispatcher can register it in
//! one call.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use research_papers_protocol::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, Implementation,
    InitializeRequest, InitializeResult, JsonRpcHandler, ListPromptsResult,
    ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, McpError, McpResult,
    McpVersion, ReadResourceParams, ReadResourceResult, ServerCapabilities, SessionContext,
    SetLevelParams, extract_params,
};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::prompt::McpPrompt;
use crate::resource::ResourceRegistry;
use crate::session::SessionManager;
use crate::tool::McpTool;

fn to_value<T: serde::Serialize>(value: T) -> McpResult<Value> {
    serde_json::to_value(value).map_err(McpError::from)
}

/// `initialize`
pub struct InitializeHandler {
    sessions: Arc<SessionManager>,
    server_info: Implementation,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
}

impl InitializeHandler {
    pub fn new(
        sessions: Arc<SessionManager>,
        server_info: Implementation,
        capabilities: ServerCapabilities,
        instructions: Option<String>,
    ) -> Self {
        Self {
            sessions,
            server_info,
            capabilities,
            instructions,
        }
    }
}

#[async_trait]
impl JsonRpcHandler for InitializeHandler {
    type Error = McpError;

    async fn handle(
        &self,
        _method: &str,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> McpResult<Value> {
        let request: InitializeRequest = extract_params(params)?;
        let version = McpVersion::negotiate(&request.protocol_version);
        info!(
            "Client {} {} requested protocol {}, using {}",
            request.client_info.name,
            request.client_info.version,
            request.protocol_version,
            version
        );

        if let Some(session) = &session {
            self.sessions
                .set_client_info(&session.session_id, request.client_info, version)
                .await;
        }

        let mut result =
            InitializeResult::new(version, self.capabilities.clone(), self.server_info.clone());
        if let Some(instructions) = &self.instructions {
            result = result.with_instructions(instructions.clone());
        }
        to_value(result)
    }

    fn supported_methods(&self) -> Vec<String> {
        vec!["initialize".to_string()]
    }
}

/// `notifications/initialized`
pub struct InitializedNotificationHandler {
    sessions: Arc<SessionManager>,
}

impl InitializedNotificationHandler {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl JsonRpcHandler for InitializedNotificationHandler {
    type Error = McpError;

    async fn handle(
        &self,
        method: &str,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> McpResult<Value> {
        self.handle_notification(method, params, session).await?;
        Ok(json!({}))
    }

    async fn handle_notification(
        &self,
        _method: &str,
        _params: Option<Value>,
        session: Option<SessionContext>,
    ) -> McpResult<()> {
        match session {
            Some(session) => {
                if self.sessions.mark_initialized(&session.session_id).await {
                    debug!("Session {} initialized", session.session_id);
                }
            }
            None => debug!("notifications/initialized without a session"),
        }
        Ok(())
    }

    fn supported_methods(&self) -> Vec<String> {
        vec!["notifications/initialized".to_string()]
    }
}

/// `ping`
pub struct PingHandler;

#[async_trait]
impl JsonRpcHandler for PingHandler {
    type Error = McpError;

    async fn handle(
        &self,
        _method: &str,
        _params: Option<Value>,
        _session: Option<SessionContext>,
    ) -> McpResult<Value> {
        Ok(json!({}))
    }

    fn supported_methods(&self) -> Vec<String> {
        vec!["ping".to_string()]
    }
}

/// `tools/list` and `tools/call`
pub struct ToolsHandler {
    tools: HashMap<String, Arc<dyn McpTool>>,
    // Registration order, used for listing
    names: Vec<String>,
}

impl ToolsHandler {
    pub fn new(tools: Vec<Arc<dyn McpTool>>) -> Self {
        let names = tools.iter().map(|t| t.name().to_string()).collect();
        let tools = tools
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Self { tools, names }
    }

    async fn call(
        &self,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> McpResult<Value> {
        let params: CallToolParams = extract_params(params)?;
        let tool = self
            .tools
            .get(&params.name)
            .ok_or_else(|| McpError::ToolNotFound(params.name.clone()))?;

        debug!("Calling tool {}", params.name);
        let result = match tool.call(params.arguments_value(), session).await {
            Ok(result) => result,
            Err(e) if is_parameter_error(&e) => return Err(e),
            Err(e) => {
                error!("Tool {} failed: {}", params.name, e);
                CallToolResult::error_text(format!("Error: {}", e))
            }
        };
        to_value(result)
    }
}

/// Errors the client can fix by changing its arguments
fn is_parameter_error(error: &McpError) -> bool {
    matches!(
        error,
        McpError::InvalidParameters(_)
            | McpError::MissingParameter(_)
            | McpError::ParameterOutOfRange { .. }
    )
}

#[async_trait]
impl JsonRpcHandler for ToolsHandler {
    type Error = McpError;

    async fn handle(
        &self,
        method: &str,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> McpResult<Value> {
        match method {
            "tools/list" => {
                let tools = self
                    .names
                    .iter()
                    .filter_map(|name| self.tools.get(name))
                    .map(|tool| tool.to_tool())
                    .collect();
                to_value(ListToolsResult {
                    tools,
                    next_cursor: None,
                })
            }
            "tools/call" => self.call(params, session).await,
            other => Err(McpError::InvalidParameters(format!(
                "Unsupported method {}",
                other
            ))),
        }
    }

    fn supported_methods(&self) -> Vec<String> {
        vec!["tools/list".to_string(), "tools/call".to_string()]
    }
}

/// `resources/list`, `resources/templates/list` and `resources/read`
pub struct ResourcesHandler {
    registry: ResourceRegistry,
}

impl ResourcesHandler {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self { registry }
    }

    async fn read(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ReadResourceParams = extract_params(params)?;
        let (resource, variables) = self
            .registry
            .resolve(&params.uri)
            .ok_or_else(|| McpError::ResourceNotFound(params.uri.clone()))?;

        debug!("Reading resource {}", params.uri);
        let contents = resource.read(&params.uri, variables).await?;
        to_value(ReadResourceResult { contents })
    }
}

#[async_trait]
impl JsonRpcHandler for ResourcesHandler {
    type Error = McpError;

    async fn handle(
        &self,
        method: &str,
        params: Option<Value>,
        _session: Option<SessionContext>,
    ) -> McpResult<Value> {
        match method {
            "resources/list" => to_value(ListResourcesResult {
                resources: self.registry.resources(),
                next_cursor: None,
            }),
            "resources/templates/list" => to_value(ListResourceTemplatesResult {
                resource_templates: self.registry.templates(),
                next_cursor: None,
            }),
            "resources/read" => self.read(params).await,
            other => Err(McpError::InvalidParameters(format!(
                "Unsupported method {}",
                other
            ))),
        }
    }

    fn supported_methods(&self) -> Vec<String> {
        vec![
            "resources/list".to_string(),
            "resources/templates/list".to_string(),
            "resources/read".to_string(),
        ]
    }
}

/// `prompts/list` and `prompts/get`
pub struct PromptsHandler {
    prompts: Vec<Arc<dyn McpPrompt>>,
}

impl PromptsHandler {
    pub fn new(prompts: Vec<Arc<dyn McpPrompt>>) -> Self {
        Self { prompts }
    }

    async fn get(&self, params: Option<Value>) -> McpResult<Value> {
        let params: GetPromptParams = extract_params(params)?;
        let prompt = self
            .prompts
            .iter()
            .find(|p| p.name() == params.name)
            .ok_or_else(|| McpError::PromptNotFound(params.name.clone()))?;

        let args = params.arguments.unwrap_or_default();
        prompt.validate_args(&args)?;
        let messages = prompt.render(args).await?;
        to_value(GetPromptResult {
            description: prompt.description().map(str::to_string),
            messages,
        })
    }
}

#[async_trait]
impl JsonRpcHandler for PromptsHandler {
    type Error = McpError;

    async fn handle(
        &self,
        method: &str,
        params: Option<Value>,
        _session: Option<SessionContext>,
    ) -> McpResult<Value> {
        match method {
            "prompts/list" => to_value(ListPromptsResult {
                prompts: self.prompts.iter().map(|p| p.to_prompt()).collect(),
                next_cursor: None,
            }),
            "prompts/get" => self.get(params).await,
            other => Err(McpError::InvalidParameters(format!(
                "Unsupported method {}",
                other
            ))),
        }
    }

    fn supported_methods(&self) -> Vec<String> {
        vec!["prompts/list".to_string(), "prompts/get".to_string()]
    }
}

/// `logging/setLevel`, stored per session
pub struct LoggingHandler {
    sessions: Arc<SessionManager>,
}

impl LoggingHandler {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl JsonRpcHandler for LoggingHandler {
    type Error = McpError;

    async fn handle(
        &self,
        _method: &str,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> McpResult<Value> {
        let params: SetLevelParams = extract_params(params)?;
        let session = session
            .ok_or_else(|| McpError::SessionError("logging/setLevel requires a session".into()))?;

        if !self
            .sessions
            .set_log_level(&session.session_id, params.level)
            .await
        {
            return Err(McpError::SessionError(format!(
                "Unknown session {}",
                session.session_id
            )));
        }
        info!(
            "Session {} log level set to {}",
            session.session_id,
            params.level.as_str()
        );
        Ok(json!({}))
    }

    fn supported_methods(&self) -> Vec<String> {
        vec!["logging/setLevel".to_string()]
    }
}
