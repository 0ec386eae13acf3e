//! Session and analysis storage abstraction.
//!
//! [`SessionStore`] holds chat transcripts and [`AnalysisCache`] holds the
//! latest analysis per repository. Both are async traits so a persistent
//! backend can replace [`memory::InMemoryStore`] without touching callers.
//!
//! Implementations must be `Send + Sync` and must serialize writers per
//! key: two concurrent appends to one session both land.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnalysisResult, ChatSession, ConversationTurn, RepoId, SessionId};

/// Lookup failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("no analysis available for repository {0}")]
    AnalysisNotFound(RepoId),
}

/// Chat transcript storage.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_session`](SessionStore::create_session) | Open a new, empty session |
/// | [`append_turn`](SessionStore::append_turn) | Append one turn to a session |
/// | [`append_turns`](SessionStore::append_turns) | Append several turns as one unit |
/// | [`get_messages`](SessionStore::get_messages) | All turns of a session, oldest first |
/// | [`get_session`](SessionStore::get_session) | Snapshot of a whole session |
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session and return its id. `title` defaults to `"New Chat"`.
    async fn create_session(
        &self,
        user_id: &str,
        repo_id: Option<RepoId>,
        title: Option<&str>,
    ) -> SessionId;

    /// Append a turn. Fails with [`StoreError::SessionNotFound`] for an
    /// unknown id, leaving every other session untouched.
    async fn append_turn(&self, id: SessionId, turn: ConversationTurn) -> Result<(), StoreError>;

    /// Append `turns` in order with no other append landing between them.
    async fn append_turns(
        &self,
        id: SessionId,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), StoreError>;

    async fn get_messages(&self, id: SessionId) -> Result<Vec<ConversationTurn>, StoreError>;

    async fn get_session(&self, id: SessionId) -> Result<ChatSession, StoreError>;
}

/// Latest analysis per repository. A put replaces any earlier result.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    async fn put_analysis(&self, result: AnalysisResult);

    async fn get_analysis(&self, repo_id: RepoId) -> Result<AnalysisResult, StoreError>;
}
