//! Server-Sent Events for the legacy HTTP+SSE transport

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use http_body::Frame;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, interval_at};
use tracing::debug;

use crate::session::SessionManager;

/// SSE event types
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// First event on a stream: where to POST messages
    Endpoint(String),
    /// Serialized JSON-RPC message
    Message(String),
    /// Keep-alive comment
    KeepAlive,
}

impl SseEvent {
    /// Format as SSE message
    pub fn format(&self) -> String {
        match self {
            SseEvent::Endpoint(uri) => format!("event: endpoint\ndata: {}\n\n", uri),
            SseEvent::Message(json) => format!("event: message\ndata: {}\n\n", json),
            // Comment lines are ignored by EventSource clients
            SseEvent::KeepAlive => ": keepalive\n\n".to_string(),
        }
    }
}

/// Removes the session once its stream is dropped (client disconnect)
pub struct SessionGuard {
    sessions: Arc<SessionManager>,
    session_id: String,
}

impl SessionGuard {
    pub fn new(sessions: Arc<SessionManager>, session_id: String) -> Self {
        Self {
            sessions,
            session_id,
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let sessions = Arc::clone(&self.sessions);
        let session_id = std::mem::take(&mut self.session_id);
        debug!("SSE stream closed for session {}", session_id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.remove(&session_id).await;
            });
        }
    }
}

struct StreamState {
    events: mpsc::Receiver<SseEvent>,
    keep_alive: Interval,
    _guard: SessionGuard,
}

/// Body stream for one SSE connection.
///
/// Yields queued events as they arrive and a keep-alive comment every
/// `keep_alive` of silence. Ends when every sender is gone.
pub fn event_stream(
    events: mpsc::Receiver<SseEvent>,
    keep_alive: Duration,
    guard: SessionGuard,
) -> impl Stream<Item = Result<Frame<Bytes>, Infallible>> + Send + 'static {
    let state = StreamState {
        events,
        keep_alive: interval_at(Instant::now() + keep_alive, keep_alive),
        _guard: guard,
    };

    futures::stream::unfold(state, |mut state| async move {
        let event = tokio::select! {
            received = state.events.recv() => match received {
                Some(event) => event,
                None => return None,
            },
            _ = state.keep_alive.tick() => SseEvent::KeepAlive,
        };
        state.keep_alive.reset();
        Some((Ok(Frame::data(Bytes::from(event.format()))), state))
    })
}
