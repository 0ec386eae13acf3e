//! Core data models shared by the crawler, the activity aggregator, the
//! context assembler, and the stores.
//!
//! These types carry repository identity, crawled file excerpts, recent
//! activity, and conversation history through the prompt-building pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kpi::ProductivityKpis;

/// Maximum number of files a single crawl may collect.
pub const MAX_FILES: usize = 20;

/// Maximum number of characters kept from each crawled file.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Number of trailing conversation turns included in a chat prompt.
pub const HISTORY_TURNS: usize = 5;

/// Placeholder for upstream fields the code host left out.
pub const UNKNOWN: &str = "unknown";

/// Numeric repository id assigned by the code host.
pub type RepoId = u64;

/// Chat session id. Derived from the wall clock, see
/// [`InMemoryStore`](crate::store::memory::InMemoryStore).
pub type SessionId = i64;

/// Upstream repository record as returned by the code host.
///
/// Only the fields the prompts render are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: RepoId,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
}

impl RepoRecord {
    /// Derive the request-scoped identity used for code-host calls.
    pub fn identity(&self) -> RepoIdentity {
        RepoIdentity {
            owner: self.owner.clone(),
            name: self.name.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Owner/name pair identifying a repository on the code host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
    pub full_name: String,
}

impl RepoIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        let full_name = format!("{}/{}", owner, name);
        Self {
            owner,
            name,
            full_name,
        }
    }
}

/// A crawled important file with its truncated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlItem {
    pub path: String,
    pub content: String,
}

/// One commit in the recent-activity summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub message: String,
    pub author_name: String,
    pub date: String,
}

impl CommitSummary {
    /// First line of the commit message.
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Per-file change statistics of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub name: String,
    pub additions: u64,
    pub deletions: u64,
}

/// One pull request in the recent-activity summary.
///
/// `changed_files` is `None` when the per-PR file listing could not be
/// fetched; the PR is still reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    pub merged: bool,
    pub changed_files: Option<Vec<FileChange>>,
}

/// Recent commits and pull requests of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub commits: Vec<CommitSummary>,
    pub pull_requests: Vec<PullRequestSummary>,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An append-only chat transcript, optionally linked to a repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub user_id: String,
    pub repo_id: Option<RepoId>,
    pub title: String,
    pub messages: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[ConversationTurn] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

/// Outcome of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Completed,
    Failed,
}

/// Stored result of analysing one repository. Last write wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub repo_id: RepoId,
    pub repo_name: String,
    pub repo_full_name: String,
    pub analysis_text: String,
    pub generated_at: DateTime<Utc>,
    pub status: AnalysisStatus,
    /// Computed from the activity the prompt was built from, whatever the
    /// model outcome.
    pub kpis: ProductivityKpis,
}
