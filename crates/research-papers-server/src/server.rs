//! HTTP MCP server: builder, accept loop and session cleanup

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use research_papers_protocol::{Implementation, JsonRpcDispatcher, McpError, ServerCapabilities};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::Result;
use crate::config::ServerConfig;
use crate::handlers::{
    InitializeHandler, InitializedNotificationHandler, LoggingHandler, PingHandler,
    PromptsHandler, ResourcesHandler, ToolsHandler,
};
use crate::http::McpHttpHandler;
use crate::prompt::McpPrompt;
use crate::resource::{McpResource, ResourceRegistry};
use crate::session::SessionManager;
use crate::tool::McpTool;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Builder for [`HttpMcpServer`]
pub struct HttpMcpServerBuilder {
    config: ServerConfig,
    server_info: Implementation,
    instructions: Option<String>,
    tools: Vec<Arc<dyn McpTool>>,
    resources: Vec<Arc<dyn McpResource>>,
    prompts: Vec<Arc<dyn McpPrompt>>,
}

impl HttpMcpServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            server_info: Implementation::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            instructions: None,
            tools: Vec::new(),
            resources: Vec::new(),
            prompts: Vec::new(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the Streamable HTTP endpoint path
    pub fn mcp_path(mut self, path: impl Into<String>) -> Self {
        self.config.mcp_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set session expiry time in minutes
    pub fn session_expiry_minutes(mut self, minutes: u64) -> Self {
        self.config.session_expiry_minutes = minutes;
        self
    }

    pub fn paper_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.paper_dir = dir.into();
        self
    }

    /// Name and version reported by `initialize`
    pub fn server_info(mut self, info: Implementation) -> Self {
        self.server_info = info;
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn tool(mut self, tool: Arc<dyn McpTool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn McpTool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn resource(mut self, resource: Arc<dyn McpResource>) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn resources(
        mut self,
        resources: impl IntoIterator<Item = Arc<dyn McpResource>>,
    ) -> Self {
        self.resources.extend(resources);
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn McpPrompt>) -> Self {
        self.prompts.push(prompt);
        self
    }

    pub fn prompts(mut self, prompts: impl IntoIterator<Item = Arc<dyn McpPrompt>>) -> Self {
        self.prompts.extend(prompts);
        self
    }

    /// Build the server. Fails when a resource URI template does not compile.
    pub fn build(self) -> Result<HttpMcpServer> {
        let sessions = Arc::new(SessionManager::new());

        let mut registry = ResourceRegistry::new();
        for resource in self.resources {
            registry.register(resource)?;
        }

        let mut dispatcher = JsonRpcDispatcher::<McpError>::new();
        dispatcher.register(InitializeHandler::new(
            Arc::clone(&sessions),
            self.server_info,
            ServerCapabilities::research_server(),
            self.instructions,
        ));
        dispatcher.register(InitializedNotificationHandler::new(Arc::clone(&sessions)));
        dispatcher.register(PingHandler);
        dispatcher.register(ToolsHandler::new(self.tools));
        dispatcher.register(ResourcesHandler::new(registry));
        dispatcher.register(PromptsHandler::new(self.prompts));
        dispatcher.register(LoggingHandler::new(Arc::clone(&sessions)));
        debug!("Registered methods: {:?}", dispatcher.registered_methods());

        let config = Arc::new(self.config);
        let handler = McpHttpHandler::new(
            Arc::clone(&config),
            Arc::new(dispatcher),
            Arc::clone(&sessions),
        );

        Ok(HttpMcpServer {
            config,
            sessions,
            handler,
        })
    }
}

impl Default for HttpMcpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// MCP server speaking Streamable HTTP and legacy HTTP+SSE on one listener
#[derive(Clone)]
pub struct HttpMcpServer {
    config: Arc<ServerConfig>,
    sessions: Arc<SessionManager>,
    handler: McpHttpHandler,
}

impl HttpMcpServer {
    pub fn builder() -> HttpMcpServerBuilder {
        HttpMcpServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn handler(&self) -> McpHttpHandler {
        self.handler.clone()
    }

    /// Bind the configured address. Port 0 picks a free port.
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        Ok(listener)
    }

    /// Run until Ctrl-C or SIGTERM
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Accept connections on `listener` until `shutdown` completes
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("HTTP MCP server listening on {}", local_addr);
        info!(
            "Streamable HTTP endpoint: {}, SSE endpoint: {}, messages endpoint: {}",
            self.config.mcp_path, self.config.sse_path, self.config.messages_path
        );

        let cleanup = self.start_session_cleanup();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    debug!("New connection from {}", peer_addr);

                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let handler = handler.clone();
                            async move {
                                Ok::<_, std::convert::Infallible>(handler.handle(req).await)
                            }
                        });

                        let served = http1::Builder::new().serve_connection(io, service).await;
                        if let Err(err) = served {
                            if err.is_incomplete_message() {
                                debug!("Client disconnected: {}", err);
                            } else {
                                error!("Error serving connection: {}", err);
                            }
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        cleanup.abort();
        Ok(())
    }

    /// Background task dropping idle sessions every minute
    fn start_session_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        // chrono panics above ~i64::MAX milliseconds
        let minutes = i64::try_from(self.config.session_expiry_minutes)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 120_000);
        let max_idle = chrono::Duration::minutes(minutes);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let expired = sessions.expire_idle(max_idle).await;
                if !expired.is_empty() {
                    info!("Expired {} sessions", expired.len());
                    for session_id in expired {
                        debug!("Expired session: {}", session_id);
                    }
                }
            }
        })
    }
}

/// Completes on Ctrl-C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::GenerateSearchPrompt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn test_builder_settings() {
        let server = HttpMcpServer::builder()
            .bind_address("127.0.0.1:0".parse().unwrap())
            .mcp_path("/rpc")
            .cors(false)
            .max_body_size(10)
            .session_expiry_minutes(5)
            .paper_dir("/tmp/papers")
            .prompt(Arc::new(GenerateSearchPrompt))
            .build()
            .unwrap();

        let config = server.config();
        assert_eq!(config.mcp_path, "/rpc");
        assert!(!config.enable_cors);
        assert_eq!(config.max_body_size, 10);
        assert_eq!(config.session_expiry_minutes, 5);
        assert_eq!(config.paper_dir, PathBuf::from("/tmp/papers"));
    }

    #[tokio::test]
    async fn test_serves_on_ephemeral_port_until_shutdown() {
        let server = HttpMcpServer::builder()
            .bind_address("127.0.0.1:0".parse().unwrap())
            .build()
            .unwrap();
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn({
            let server = server.clone();
            async move {
                server
                    .serve(listener, async {
                        let _ = stop_rx.await;
                    })
                    .await
            }
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("ok"));

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }
}
