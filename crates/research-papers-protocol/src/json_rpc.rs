//! JSON-RPC 2.0 message model
//!
//! Transport-agnostic request, notification and response types plus the
//! classification of raw payloads into requests or notifications.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}

/// Request identifier, either numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

/// The `"jsonrpc": "2.0"` marker. Any other value is rejected on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(de::Error::custom(format!(
                "unsupported jsonrpc version '{}'",
                version
            )))
        }
    }
}

/// A JSON-RPC request (expects a response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC notification (no id, never answered)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

/// A successful JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result,
        }
    }
}

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError(i64),
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError(_) => "Server error",
        }
    }
}

/// The `error` member of an error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(JsonRpcErrorCode::ParseError, None, None)
    }

    pub fn invalid_request(detail: Option<String>) -> Self {
        Self::new(
            JsonRpcErrorCode::InvalidRequest,
            None,
            detail.map(Value::String),
        )
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound,
            Some(format!("Method '{}' not found", method)),
            None,
        )
    }

    pub fn invalid_params(message: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::InvalidParams,
            Some(message.to_string()),
            None,
        )
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, None)
    }

    /// Server-defined error. Codes outside -32099..=-32000 are clamped to -32000.
    pub fn server_error(code: i64, message: &str) -> Self {
        let code = if (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END)
            .contains(&code)
        {
            code
        } else {
            error_codes::SERVER_ERROR_END
        };
        Self::new(
            JsonRpcErrorCode::ServerError(code),
            Some(message.to_string()),
            None,
        )
    }
}

/// A JSON-RPC error response. `id` is serialized as `null` when unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: JsonRpcVersion,
    pub id: Option<RequestId>,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcError {
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            error,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorObject::parse_error())
    }

    pub fn invalid_request(id: Option<RequestId>, detail: Option<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_request(detail))
    }

    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(Some(id), JsonRpcErrorObject::method_not_found(method))
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}

/// Outgoing message: either a result or an error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Response(JsonRpcResponse),
    Error(JsonRpcError),
}

impl JsonRpcMessage {
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Response(resp) => Some(&resp.id),
            JsonRpcMessage::Error(err) => err.id.as_ref(),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// Incoming message after classification
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Parse a raw payload into a request or notification.
///
/// Malformed JSON is a parse error; well-formed JSON that is not a single
/// request or notification object is an invalid request. When the payload
/// carries a usable `id`, it is echoed back in the error.
pub fn parse_message(text: &str) -> Result<IncomingMessage, JsonRpcError> {
    let value: Value = serde_json::from_str(text).map_err(|_| JsonRpcError::parse_error())?;
    parse_value(value)
}

/// Classify an already-decoded JSON value; see [`parse_message`].
pub fn parse_value(value: Value) -> Result<IncomingMessage, JsonRpcError> {
    let Value::Object(ref object) = value else {
        return Err(JsonRpcError::invalid_request(
            None,
            Some("expected a single JSON-RPC object".to_string()),
        ));
    };

    let id = object
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    let has_id = object.get("id").is_some_and(|id| !id.is_null());

    if has_id {
        serde_json::from_value::<JsonRpcRequest>(value)
            .map(IncomingMessage::Request)
            .map_err(|e| JsonRpcError::invalid_request(id, Some(e.to_string())))
    } else {
        serde_json::from_value::<JsonRpcNotification>(value)
            .map(IncomingMessage::Notification)
            .map_err(|e| JsonRpcError::invalid_request(None, Some(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_roundtrip_keeps_id_and_method() {
        let request = JsonRpcRequest::new(7, "tools/list", None);
        let text = serde_json::to_string(&request).unwrap();
        assert!(text.contains("\"jsonrpc\":\"2.0\""));
        assert!(!text.contains("params"));

        let parsed: JsonRpcRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.id, RequestId::Number(7));
        assert_eq!(parsed.method, "tools/list");
    }

    #[test]
    fn test_parse_classifies_notification() {
        let message =
            parse_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        let IncomingMessage::Notification(notification) = message else {
            panic!("expected notification");
        };
        assert_eq!(notification.method, "notifications/initialized");
    }

    #[test]
    fn test_parse_string_id_request() {
        let message =
            parse_message(r#"{"jsonrpc":"2.0","id":"abc","method":"ping","params":{}}"#).unwrap();
        let IncomingMessage::Request(request) = message else {
            panic!("expected request");
        };
        assert_eq!(request.id, RequestId::String("abc".to_string()));
        assert_eq!(request.params, Some(json!({})));
    }

    #[test]
    fn test_parse_error_for_malformed_json() {
        let err = parse_message("{not json").unwrap_err();
        assert_eq!(err.error.code, error_codes::PARSE_ERROR);
        assert!(err.id.is_none());
    }

    #[test]
    fn test_invalid_request_keeps_id() {
        let err = parse_message(r#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.code, error_codes::INVALID_REQUEST);
        assert_eq!(err.id, Some(RequestId::Number(3)));
    }

    #[test]
    fn test_batch_is_rejected() {
        let err = parse_message(r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#).unwrap_err();
        assert_eq!(err.error.code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_error_response_serializes_null_id() {
        let text = serde_json::to_string(&JsonRpcError::parse_error()).unwrap();
        assert!(text.contains("\"id\":null"));
        assert!(text.contains("-32700"));
    }

    #[test]
    fn test_server_error_code_is_clamped() {
        assert_eq!(JsonRpcErrorObject::server_error(-32010, "x").code, -32010);
        assert_eq!(JsonRpcErrorObject::server_error(42, "x").code, -32000);
    }
}
