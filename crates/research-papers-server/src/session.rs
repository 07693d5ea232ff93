//! In-memory session registry

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use research_papers_protocol::{Implementation, LoggingLevel, McpVersion};
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::sse::SseEvent;

/// How the client reached us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    StreamableHttp,
    Sse,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub transport: Transport,
    pub client_info: Option<Implementation>,
    pub protocol_version: Option<McpVersion>,
    /// Set once the client sends `notifications/initialized`
    pub initialized: bool,
    pub log_level: Option<LoggingLevel>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    sse_sender: Option<mpsc::Sender<SseEvent>>,
}

impl Session {
    fn new(transport: Transport, sse_sender: Option<mpsc::Sender<SseEvent>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            transport,
            client_info: None,
            protocol_version: None,
            initialized: false,
            log_level: None,
            created_at: now,
            last_activity: now,
            sse_sender,
        }
    }

    /// An SSE session whose stream is still being read
    fn has_open_stream(&self) -> bool {
        self.sse_sender.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

/// Sessions keyed by id
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// New Streamable HTTP session, returns its id
    pub async fn create_session(&self) -> String {
        self.insert(Session::new(Transport::StreamableHttp, None)).await
    }

    /// New SSE session delivering responses through `sender`
    pub async fn create_sse_session(&self, sender: mpsc::Sender<SseEvent>) -> String {
        self.insert(Session::new(Transport::Sse, Some(sender))).await
    }

    async fn insert(&self, session: Session) -> String {
        let id = session.id.clone();
        debug!("Created {:?} session {}", session.transport, id);
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Record activity; false when the session is unknown
    pub async fn touch(&self, session_id: &str) -> bool {
        self.update(session_id, |s| s.last_activity = Utc::now()).await
    }

    pub async fn set_client_info(
        &self,
        session_id: &str,
        client_info: Implementation,
        version: McpVersion,
    ) -> bool {
        self.update(session_id, |s| {
            s.client_info = Some(client_info);
            s.protocol_version = Some(version);
        })
        .await
    }

    pub async fn mark_initialized(&self, session_id: &str) -> bool {
        self.update(session_id, |s| s.initialized = true).await
    }

    pub async fn set_log_level(&self, session_id: &str, level: LoggingLevel) -> bool {
        self.update(session_id, |s| s.log_level = Some(level)).await
    }

    async fn update(&self, session_id: &str, f: impl FnOnce(&mut Session)) -> bool {
        match self.sessions.write().await.get_mut(session_id) {
            Some(session) => {
                f(session);
                true
            }
            None => false,
        }
    }

    /// Channel feeding the session's SSE stream
    pub async fn sse_sender(&self, session_id: &str) -> Option<mpsc::Sender<SseEvent>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .and_then(|s| s.sse_sender.clone())
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            debug!("Removed session {}", session_id);
        }
        removed
    }

    /// Drop sessions idle for longer than `max_idle`. Open SSE streams are kept.
    pub async fn expire_idle(&self, max_idle: Duration) -> Vec<String> {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.last_activity < cutoff && !s.has_open_stream())
            .map(|s| s.id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
