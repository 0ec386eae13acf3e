//! Chat and analysis flows.
//!
//! [`Assistant`] ties the pieces together for one request: resolve the
//! repository, assemble the prompt, call the model, and record the result
//! in the session or analysis store.
//!
//! A model failure never becomes an error here. The user gets
//! [`DEGRADED_RESPONSE`] and the reply is flagged as degraded.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use repo_context_core::kpi::ProductivityKpis;
use repo_context_core::models::{
    AnalysisResult, AnalysisStatus, ConversationTurn, RepoId, SessionId,
};
use repo_context_core::store::memory::InMemoryStore;
use repo_context_core::store::{AnalysisCache, SessionStore, StoreError};

use crate::config::Config;
use crate::context::ContextAssembler;
use crate::host::CodeHost;
use crate::model::{LanguageModel, DEGRADED_RESPONSE};

/// Response to a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    /// `true` when the model failed and `response` is the apology text.
    pub degraded: bool,
}

/// Request-level entry point over shared stores.
///
/// The code host is passed per call because it carries the caller's
/// access token.
pub struct Assistant {
    config: Config,
    model: Arc<dyn LanguageModel>,
    sessions: Arc<dyn SessionStore>,
    analyses: Arc<dyn AnalysisCache>,
}

impl Assistant {
    pub fn new(
        config: Config,
        model: Arc<dyn LanguageModel>,
        sessions: Arc<dyn SessionStore>,
        analyses: Arc<dyn AnalysisCache>,
    ) -> Self {
        Self {
            config,
            model,
            sessions,
            analyses,
        }
    }

    /// Assistant backed by one process-lifetime [`InMemoryStore`].
    pub fn in_memory(config: Config, model: Arc<dyn LanguageModel>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(config, model, store.clone(), store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn open_session(
        &self,
        user_id: &str,
        repo_id: Option<RepoId>,
        title: Option<&str>,
    ) -> SessionId {
        let id = self.sessions.create_session(user_id, repo_id, title).await;
        info!(session = id, user = user_id, ?repo_id, "session opened");
        id
    }

    pub async fn messages(&self, session_id: SessionId) -> Result<Vec<ConversationTurn>, StoreError> {
        self.sessions.get_messages(session_id).await
    }

    /// Answer `message` in the context of a session and record both turns.
    ///
    /// Fails only when the session does not exist.
    pub async fn send_message(
        &self,
        host: &dyn CodeHost,
        session_id: SessionId,
        message: &str,
    ) -> Result<ChatReply, StoreError> {
        let session = self.sessions.get_session(session_id).await?;

        let repo = match session.repo_id {
            Some(id) => match host.get_repository(id).await {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(session = session_id, repo_id = id, error = %e, "repository lookup failed");
                    None
                }
            },
            None => None,
        };

        let context = ContextAssembler::new(host, &self.config)
            .build_chat_context(&session, repo.as_ref())
            .await;
        let prompt = format!("{}\n\n{}", context, message);

        let reply = match self.model.generate(&prompt).await {
            Ok(text) => ChatReply {
                response: text,
                degraded: false,
            },
            Err(e) => {
                warn!(session = session_id, model = self.model.model_name(), error = %e, "model call failed");
                ChatReply {
                    response: DEGRADED_RESPONSE.to_string(),
                    degraded: true,
                }
            }
        };

        self.sessions
            .append_turns(
                session_id,
                vec![
                    ConversationTurn::user(message),
                    ConversationTurn::assistant(reply.response.clone()),
                ],
            )
            .await?;

        Ok(reply)
    }

    /// Analyse a repository and store the result, replacing any earlier one.
    ///
    /// Fails only when the repository record itself cannot be fetched.
    pub async fn analyze(&self, host: &dyn CodeHost, repo_id: RepoId) -> Result<AnalysisResult> {
        let repo = host
            .get_repository(repo_id)
            .await
            .with_context(|| format!("Failed to fetch repository {}", repo_id))?;

        let context = ContextAssembler::new(host, &self.config)
            .assemble_analysis(&repo)
            .await;
        let kpis = ProductivityKpis::from_activity(&context.activity);
        info!(
            repo = %repo.full_name,
            prompt_chars = context.text.chars().count(),
            productivity = kpis.productivity_score,
            "requesting analysis"
        );

        let (analysis_text, status) = match self.model.generate(&context.text).await {
            Ok(text) => (text, AnalysisStatus::Completed),
            Err(e) => {
                warn!(repo = %repo.full_name, error = %e, "analysis model call failed");
                (DEGRADED_RESPONSE.to_string(), AnalysisStatus::Failed)
            }
        };

        let result = AnalysisResult {
            repo_id,
            repo_name: repo.name.clone(),
            repo_full_name: repo.full_name.clone(),
            analysis_text,
            generated_at: Utc::now(),
            status,
            kpis,
        };
        self.analyses.put_analysis(result.clone()).await;
        Ok(result)
    }

    pub async fn analysis(&self, repo_id: RepoId) -> Result<AnalysisResult, StoreError> {
        self.analyses.get_analysis(repo_id).await
    }
}
