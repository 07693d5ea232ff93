//! Method dispatch for JSON-RPC handlers

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::json_rpc::{
    JsonRpcError, JsonRpcErrorObject, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse,
};

/// Per-request session information handed from the transport to handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Unique session identifier
    pub session_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

/// Errors that can be rendered as a JSON-RPC error object
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

/// Trait for handling JSON-RPC method calls
#[async_trait]
pub trait JsonRpcHandler: Send + Sync {
    /// Domain error type; the dispatcher converts it to a JSON-RPC error
    type Error: ToJsonRpcError;

    async fn handle(
        &self,
        method: &str,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> Result<Value, Self::Error>;

    /// Handle a notification (default: ignore)
    async fn handle_notification(
        &self,
        method: &str,
        params: Option<Value>,
        session: Option<SessionContext>,
    ) -> Result<(), Self::Error> {
        let _ = (method, params, session);
        Ok(())
    }

    /// Methods served by this handler
    fn supported_methods(&self) -> Vec<String> {
        vec![]
    }
}

/// Routes requests and notifications to registered handlers by method name
pub struct JsonRpcDispatcher<E>
where
    E: ToJsonRpcError,
{
    handlers: HashMap<String, Arc<dyn JsonRpcHandler<Error = E>>>,
}

impl<E> JsonRpcDispatcher<E>
where
    E: ToJsonRpcError,
{
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register one handler instance for several methods
    pub fn register_methods<H>(&mut self, methods: Vec<String>, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        self.register_shared(methods, Arc::new(handler));
    }

    /// Register a handler under every method it reports in `supported_methods`
    pub fn register<H>(&mut self, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        let methods = handler.supported_methods();
        self.register_methods(methods, handler);
    }

    pub fn register_shared(
        &mut self,
        methods: Vec<String>,
        handler: Arc<dyn JsonRpcHandler<Error = E>>,
    ) {
        for method in methods {
            self.handlers.insert(method, Arc::clone(&handler));
        }
    }

    fn handler_for(&self, method: &str) -> Option<&Arc<dyn JsonRpcHandler<Error = E>>> {
        self.handlers.get(method)
    }

    /// Process a request and produce the response message
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        session: Option<SessionContext>,
    ) -> JsonRpcMessage {
        let Some(handler) = self.handler_for(&request.method) else {
            debug!("No handler registered for {}", request.method);
            return JsonRpcError::method_not_found(request.id, &request.method).into();
        };

        match handler
            .handle(&request.method, request.params, session)
            .await
        {
            Ok(result) => JsonRpcResponse::success(request.id, result).into(),
            Err(domain_error) => {
                JsonRpcError::new(Some(request.id), domain_error.to_error_object()).into()
            }
        }
    }

    /// Process a notification. Unknown methods are ignored.
    pub async fn handle_notification(
        &self,
        notification: JsonRpcNotification,
        session: Option<SessionContext>,
    ) -> Result<(), E> {
        match self.handler_for(&notification.method) {
            Some(handler) => {
                handler
                    .handle_notification(&notification.method, notification.params, session)
                    .await
            }
            None => {
                debug!("Ignoring unhandled notification {}", notification.method);
                Ok(())
            }
        }
    }

    pub fn registered_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.keys().cloned().collect();
        methods.sort();
        methods
    }
}

impl<E> Default for JsonRpcDispatcher<E>
where
    E: ToJsonRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}
