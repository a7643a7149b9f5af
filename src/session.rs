//! Ephemeral learning-session bookkeeping.
//!
//! Sessions live for the process lifetime only. Storage hides behind a
//! trait so a persistent backend can be substituted without touching the
//! handlers.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::protocols::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub language: String,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub goals: Vec<String>,
    pub created_at: String,
    pub last_activity: String,
    pub message_count: u64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl SessionMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub language: Option<String>,
    pub level: Option<String>,
    pub topic: Option<String>,
    pub goals: Vec<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, user_id: &str, opts: SessionOptions) -> Session;

    async fn sessions_for_user(&self, user_id: &str) -> Vec<Session>;

    /// Fails with `SessionNotFound` when the id is absent or owned by a
    /// different user; absence and foreign ownership are indistinguishable
    /// to the caller.
    async fn history(&self, session_id: &str, user_id: &str)
        -> Result<Vec<SessionMessage>, ApiError>;

    /// Appends to the session history, bumps `message_count` and refreshes
    /// `last_activity`. Mutates nothing on failure.
    async fn append_message(
        &self,
        session_id: &str,
        user_id: &str,
        message: SessionMessage,
    ) -> Result<Session, ApiError>;
}

struct SessionRecord {
    session: Session,
    history: Vec<SessionMessage>,
}

/// In-memory store; linear scans are fine at demo scale.
#[derive(Default)]
pub struct MemorySessionStore {
    records: DashMap<String, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, user_id: &str, opts: SessionOptions) -> Session {
        let now = Utc::now().to_rfc3339();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            language: opts.language.unwrap_or_else(|| "English".to_string()),
            level: opts.level.unwrap_or_else(|| "intermediate".to_string()),
            topic: opts.topic,
            goals: opts.goals,
            created_at: now.clone(),
            last_activity: now,
            message_count: 0,
            status: "active".to_string(),
        };
        self.records.insert(
            session.id.clone(),
            SessionRecord {
                session: session.clone(),
                history: Vec::new(),
            },
        );
        session
    }

    async fn sessions_for_user(&self, user_id: &str) -> Vec<Session> {
        self.records
            .iter()
            .filter(|entry| entry.session.user_id == user_id)
            .map(|entry| entry.session.clone())
            .collect()
    }

    async fn history(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Vec<SessionMessage>, ApiError> {
        let record = self
            .records
            .get(session_id)
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;
        if record.session.user_id != user_id {
            return Err(ApiError::SessionNotFound(session_id.to_string()));
        }
        Ok(record.history.clone())
    }

    async fn append_message(
        &self,
        session_id: &str,
        user_id: &str,
        message: SessionMessage,
    ) -> Result<Session, ApiError> {
        let mut record = self
            .records
            .get_mut(session_id)
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;
        if record.session.user_id != user_id {
            return Err(ApiError::SessionNotFound(session_id.to_string()));
        }
        record.history.push(message);
        record.session.message_count += 1;
        record.session.last_activity = Utc::now().to_rfc3339();
        Ok(record.session.clone())
    }
}
