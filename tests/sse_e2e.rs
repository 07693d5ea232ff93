//! End-to-end tests for the legacy HTTP+SSE transport
//!
//! The client opens `GET /sse`, reads the `endpoint` event, POSTs JSON-RPC
//! messages there and reads the replies back from the event stream.

mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{TestServer, http_client};
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde_json::{Value, json};

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal SSE reader over a reqwest byte stream
struct SseReader<S> {
    stream: S,
    buffer: String,
}

impl<S> SseReader<S>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: String::new(),
        }
    }

    /// Next `(event, data)` pair, skipping comment-only blocks
    async fn next_event(&mut self) -> (String, String) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::from("message");
                let mut data = Vec::new();
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event: ") {
                        event = value.to_string();
                    } else if let Some(value) = line.strip_prefix("data: ") {
                        data.push(value);
                    }
                }
                if data.is_empty() {
                    continue;
                }
                return (event, data.join("\n"));
            }

            let chunk = tokio::time::timeout(READ_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for SSE data")
                .expect("SSE stream ended")
                .unwrap();
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    /// Next `message` event decoded as JSON
    async fn next_message(&mut self) -> Value {
        let (event, data) = self.next_event().await;
        assert_eq!(event, "message");
        serde_json::from_str(&data).unwrap()
    }
}

async fn open_stream(
    server: &TestServer,
) -> (
    String,
    SseReader<impl Stream<Item = reqwest::Result<Bytes>> + Unpin>,
) {
    let response = http_client()
        .get(server.url("/sse"))
        .header("accept", "text/event-stream")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut reader = SseReader::new(Box::pin(response.bytes_stream()));
    let (event, endpoint) = reader.next_event().await;
    assert_eq!(event, "endpoint");
    assert!(endpoint.starts_with("/messages/?session_id="));
    (endpoint, reader)
}

async fn post_message(server: &TestServer, endpoint: &str, message: Value) -> StatusCode {
    http_client()
        .post(server.url(endpoint))
        .header("content-type", "application/json")
        .body(message.to_string())
        .send()
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_initialize_and_list_tools_over_sse() {
    let server = TestServer::start().await;
    let (endpoint, mut reader) = open_stream(&server).await;

    let status = post_message(
        &server,
        &endpoint,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "sse-client", "version": "1.0"}
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let reply = reader.next_message().await;
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");

    let status = post_message(
        &server,
        &endpoint,
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let status = post_message(
        &server,
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let reply = reader.next_message().await;
    assert_eq!(reply["id"], 2);
    assert_eq!(reply["result"]["tools"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_over_sse() {
    let server = TestServer::start().await;
    let (endpoint, mut reader) = open_stream(&server).await;

    post_message(
        &server,
        &endpoint,
        json!({
            "jsonrpc": "2.0",
            "id": "search",
            "method": "tools/call",
            "params": {"name": "search_papers", "arguments": {"topic": "transformers", "max_results": 1}}
        }),
    )
    .await;

    let reply = reader.next_message().await;
    assert_eq!(reply["id"], "search");
    assert_eq!(
        reply["result"]["structuredContent"]["paper_ids"],
        json!(["1706.03762v7"])
    );
    assert!(
        server
            .paper_dir
            .path()
            .join("transformers")
            .join("papers_info.json")
            .is_file()
    );
}

#[tokio::test]
async fn test_message_errors() {
    let server = TestServer::start().await;
    let (endpoint, _reader) = open_stream(&server).await;

    let unknown = post_message(
        &server,
        "/messages/?session_id=no-such-session",
        json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    )
    .await;
    assert_eq!(unknown, StatusCode::NOT_FOUND);

    let missing = post_message(
        &server,
        "/messages/",
        json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    )
    .await;
    assert_eq!(missing, StatusCode::BAD_REQUEST);

    let garbage = http_client()
        .post(server.url(&endpoint))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
}
