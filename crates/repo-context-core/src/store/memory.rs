//! In-memory [`SessionStore`] and [`AnalysisCache`] implementation.
//!
//! Uses `HashMap` behind `std::sync::RwLock`. State lives as long as the
//! store; nothing is persisted or evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{AnalysisResult, ChatSession, ConversationTurn, RepoId, SessionId};

use super::{AnalysisCache, SessionStore, StoreError};

const DEFAULT_TITLE: &str = "New Chat";

/// Process-lifetime store for sessions and analyses.
pub struct InMemoryStore {
    sessions: RwLock<HashMap<SessionId, ChatSession>>,
    analyses: RwLock<HashMap<RepoId, AnalysisResult>>,
    last_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            analyses: RwLock::new(HashMap::new()),
            last_id: AtomicI64::new(0),
        }
    }

    /// Millisecond timestamp, bumped past the previous id when two
    /// sessions open within the same millisecond.
    fn next_id(&self) -> SessionId {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(
        &self,
        user_id: &str,
        repo_id: Option<RepoId>,
        title: Option<&str>,
    ) -> SessionId {
        let id = self.next_id();
        let session = ChatSession {
            id,
            user_id: user_id.to_string(),
            repo_id,
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session);
        id
    }

    async fn append_turn(&self, id: SessionId, turn: ConversationTurn) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get_mut(&id)
            .ok_or(StoreError::SessionNotFound(id))?;
        session.messages.push(turn);
        Ok(())
    }

    async fn append_turns(
        &self,
        id: SessionId,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get_mut(&id)
            .ok_or(StoreError::SessionNotFound(id))?;
        session.messages.extend(turns);
        Ok(())
    }

    async fn get_messages(&self, id: SessionId) -> Result<Vec<ConversationTurn>, StoreError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&id)
            .map(|s| s.messages.clone())
            .ok_or(StoreError::SessionNotFound(id))
    }

    async fn get_session(&self, id: SessionId) -> Result<ChatSession, StoreError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&id)
            .cloned()
            .ok_or(StoreError::SessionNotFound(id))
    }
}

#[async_trait]
impl AnalysisCache for InMemoryStore {
    async fn put_analysis(&self, result: AnalysisResult) {
        self.analyses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(result.repo_id, result);
    }

    async fn get_analysis(&self, repo_id: RepoId) -> Result<AnalysisResult, StoreError> {
        let analyses = self.analyses.read().unwrap_or_else(PoisonError::into_inner);
        analyses
            .get(&repo_id)
            .cloned()
            .ok_or(StoreError::AnalysisNotFound(repo_id))
    }
}
