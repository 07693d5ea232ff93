//! HTTP request handling for both MCP transports
//!
//! * Streamable HTTP: `POST <mcp_path>` answers with `application/json`,
//!   `DELETE <mcp_path>` ends a session.
//! * Legacy HTTP+SSE: `GET <sse_path>` opens the event stream, and
//!   `POST <messages_path>?session_id=..` queues requests whose responses are
//!   delivered as `message` events on that stream.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited, StreamBody};
use hyper::{Request, Response};
use research_papers_protocol::json_rpc::parse_message;
use research_papers_protocol::{
    IncomingMessage, JsonRpcDispatcher, JsonRpcError, JsonRpcMessage, McpError, McpVersion,
    SessionContext,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::cors::CorsLayer;
use crate::session::SessionManager;
use crate::sse::{SessionGuard, SseEvent, event_stream};

pub type ResponseBody = UnsyncBoxBody<Bytes, Infallible>;

pub const MCP_SESSION_ID: &str = "mcp-session-id";
pub const MCP_PROTOCOL_VERSION: &str = "mcp-protocol-version";

const HEALTH_PATH: &str = "/health";
const SSE_CHANNEL_CAPACITY: usize = 32;

/// Routes requests to the transport endpoints
#[derive(Clone)]
pub struct McpHttpHandler {
    config: Arc<ServerConfig>,
    dispatcher: Arc<JsonRpcDispatcher<McpError>>,
    sessions: Arc<SessionManager>,
}

impl McpHttpHandler {
    pub fn new(
        config: Arc<ServerConfig>,
        dispatcher: Arc<JsonRpcDispatcher<McpError>>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            sessions,
        }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("Handling {} {}", method, path);

        let mut response = if method == Method::OPTIONS {
            empty_response(StatusCode::NO_CONTENT)
        } else if path == HEALTH_PATH {
            match method {
                Method::GET => text_response(StatusCode::OK, "ok"),
                _ => method_not_allowed("GET"),
            }
        } else if path == self.config.mcp_path {
            match method {
                Method::POST => self.handle_mcp_post(req).await,
                Method::DELETE => {
                    let session_id = header_str(&req, MCP_SESSION_ID).map(str::to_string);
                    self.handle_delete(session_id).await
                }
                _ => method_not_allowed("POST, DELETE"),
            }
        } else if path == self.config.sse_path {
            match method {
                Method::GET => self.handle_sse_get().await,
                _ => method_not_allowed("GET"),
            }
        } else if self.config.is_messages_path(&path) {
            match method {
                Method::POST => self.handle_message_post(req).await,
                _ => method_not_allowed("POST"),
            }
        } else {
            text_response(StatusCode::NOT_FOUND, "Not Found")
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    /// Streamable HTTP request or notification
    async fn handle_mcp_post<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if !is_json_content_type(&req) {
            return text_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json",
            );
        }

        if let Some(version) = header_str(&req, MCP_PROTOCOL_VERSION) {
            if McpVersion::parse(version).is_none() {
                return text_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Unsupported MCP-Protocol-Version: {}", version),
                );
            }
        }

        let session_id = header_str(&req, MCP_SESSION_ID).map(str::to_string);
        if let Some(id) = &session_id {
            if !self.sessions.touch(id).await {
                return text_response(StatusCode::NOT_FOUND, "Session not found");
            }
        }

        let body = match self.read_body(req.into_body()).await {
            Ok(body) => body,
            Err(response) => return response,
        };

        let message = match parse_body(&body) {
            Ok(message) => message,
            Err(rpc_error) => {
                debug!("Rejecting malformed message: {}", rpc_error);
                return json_response(StatusCode::OK, &JsonRpcMessage::Error(rpc_error));
            }
        };

        match message {
            IncomingMessage::Request(request) => {
                let (session_id, created) = match session_id {
                    Some(id) => (Some(id), false),
                    None if request.method == "initialize" => {
                        (Some(self.sessions.create_session().await), true)
                    }
                    None => (None, false),
                };

                let context = session_id.as_deref().map(SessionContext::new);
                let reply = self.dispatcher.handle_request(request, context).await;

                // A failed initialize leaves no session behind
                if created && reply.is_error() {
                    if let Some(id) = &session_id {
                        self.sessions.remove(id).await;
                    }
                    return json_response(StatusCode::OK, &reply);
                }

                let mut response = json_response(StatusCode::OK, &reply);
                if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
                    response.headers_mut().insert(MCP_SESSION_ID, value);
                }
                response
            }
            IncomingMessage::Notification(notification) => {
                let context = session_id.as_deref().map(SessionContext::new);
                let method = notification.method.clone();
                if let Err(e) = self
                    .dispatcher
                    .handle_notification(notification, context)
                    .await
                {
                    warn!("Notification {} failed: {}", method, e);
                }
                empty_response(StatusCode::ACCEPTED)
            }
        }
    }

    async fn handle_delete(&self, session_id: Option<String>) -> Response<ResponseBody> {
        let Some(session_id) = session_id else {
            return text_response(StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header");
        };
        if self.sessions.remove(&session_id).await {
            debug!("Session {} terminated by client", session_id);
            text_response(StatusCode::OK, "Session terminated")
        } else {
            text_response(StatusCode::NOT_FOUND, "Session not found")
        }
    }

    /// Open a legacy SSE stream. The first event tells the client where to POST.
    async fn handle_sse_get(&self) -> Response<ResponseBody> {
        let (tx, rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);
        let session_id = self.sessions.create_sse_session(tx.clone()).await;

        let endpoint = format!("{}?session_id={}", self.config.messages_path, session_id);
        if tx.try_send(SseEvent::Endpoint(endpoint)).is_err() {
            self.sessions.remove(&session_id).await;
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to open stream");
        }
        drop(tx);
        debug!("Opened SSE stream for session {}", session_id);

        let guard = SessionGuard::new(Arc::clone(&self.sessions), session_id);
        let stream = event_stream(rx, self.config.keep_alive_interval, guard);

        let mut response = Response::new(StreamBody::new(stream).boxed_unsync());
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        response
    }

    /// Legacy SSE message POST, answered with 202 while the reply goes to the stream
    async fn handle_message_post<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let Some(session_id) = query_session_id(req.uri().query()) else {
            return text_response(StatusCode::BAD_REQUEST, "session_id is required");
        };
        let Some(sender) = self.sessions.sse_sender(&session_id).await else {
            return text_response(StatusCode::NOT_FOUND, "Could not find session");
        };
        self.sessions.touch(&session_id).await;

        let body = match self.read_body(req.into_body()).await {
            Ok(body) => body,
            Err(response) => return response,
        };
        let message = match parse_body(&body) {
            Ok(message) => message,
            Err(rpc_error) => {
                debug!("Rejecting malformed SSE message: {}", rpc_error);
                return text_response(StatusCode::BAD_REQUEST, "Could not parse message");
            }
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let context = Some(SessionContext::new(session_id.clone()));
            match message {
                IncomingMessage::Request(request) => {
                    let reply = dispatcher.handle_request(request, context).await;
                    match serde_json::to_string(&reply) {
                        Ok(json) => {
                            if sender.send(SseEvent::Message(json)).await.is_err() {
                                debug!("SSE stream for {} closed before reply", session_id);
                            }
                        }
                        Err(e) => error!("Failed to serialize reply: {}", e),
                    }
                }
                IncomingMessage::Notification(notification) => {
                    let method = notification.method.clone();
                    if let Err(e) = dispatcher.handle_notification(notification, context).await {
                        warn!("Notification {} failed: {}", method, e);
                    }
                }
            }
        });

        text_response(StatusCode::ACCEPTED, "Accepted")
    }

    async fn read_body<B>(&self, body: B) -> Result<Bytes, Response<ResponseBody>>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match Limited::new(body, self.config.max_body_size).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(text_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
            )),
            Err(e) => {
                warn!("Failed to read request body: {}", e);
                Err(text_response(
                    StatusCode::BAD_REQUEST,
                    "Failed to read request body",
                ))
            }
        }
    }
}

fn parse_body(body: &[u8]) -> Result<IncomingMessage, JsonRpcError> {
    let text = std::str::from_utf8(body).map_err(|_| JsonRpcError::parse_error())?;
    parse_message(text)
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn is_json_content_type<B>(req: &Request<B>) -> bool {
    header_str(req, CONTENT_TYPE.as_str()).is_some_and(|value| {
        value
            .split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
    })
}

fn query_session_id(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "session_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn full_body(body: impl Into<Bytes>) -> ResponseBody {
    Full::new(body.into()).boxed_unsync()
}

fn empty_response(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn text_response(status: StatusCode, text: &str) -> Response<ResponseBody> {
    let mut response = Response::new(full_body(text.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<ResponseBody> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(full_body(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn method_not_allowed(allow: &'static str) -> Response<ResponseBody> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}
