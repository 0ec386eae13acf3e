//! Code-host adapter interface.
//!
//! [`CodeHost`] is the narrow surface the crawler, aggregator, and
//! assembler consume. [`GitHubClient`](crate::github::GitHubClient) is the
//! HTTP implementation; tests script their own.
//!
//! Every method may fail with a transport or HTTP error. Callers treat any
//! failure as "data unavailable" and keep going.
//!
//! Wire types keep upstream fields optional; defaulting happens in the
//! aggregator, not here.

use anyhow::Result;
use async_trait::async_trait;

use repo_context_core::models::{FileChange, RepoId, RepoIdentity, RepoRecord};

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules, and anything else the crawler ignores.
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self::with_kind(path, EntryKind::File)
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self::with_kind(path, EntryKind::Dir)
    }

    fn with_kind(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { name, path, kind }
    }
}

/// File content in the host's transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub path: String,
    pub content: String,
    /// `"base64"` for GitHub; anything else is taken as plain text.
    pub encoding: String,
}

/// Response of a contents lookup: either a listing or a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    Directory(Vec<DirEntry>),
    File(FileBlob),
}

/// Upstream commit with possibly missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCommit {
    pub sha: String,
    pub message: Option<String>,
    pub author_name: Option<String>,
    pub date: Option<String>,
}

/// Upstream pull request with possibly missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPullRequest {
    pub number: u64,
    pub title: Option<String>,
    pub state: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub merged_at: Option<String>,
}

/// State filter for pull request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
    All,
}

impl PrState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::All => "all",
        }
    }
}

/// Read-only access to a code-hosting API.
///
/// # Example
///
/// ```rust
/// use anyhow::{bail, Result};
/// use async_trait::async_trait;
/// use repo_context::host::{CodeHost, Contents, FileBlob, PrState, RawCommit, RawPullRequest};
/// use repo_context_core::models::{FileChange, RepoId, RepoIdentity, RepoRecord};
///
/// struct Offline;
///
/// #[async_trait]
/// impl CodeHost for Offline {
///     async fn get_repository(&self, id: RepoId) -> Result<RepoRecord> {
///         bail!("offline: {}", id)
///     }
///     async fn get_entry(&self, repo: &RepoIdentity, path: &str) -> Result<Contents> {
///         bail!("offline: {}/{}", repo.full_name, path)
///     }
///     async fn get_readme(&self, _repo: &RepoIdentity) -> Result<Option<FileBlob>> {
///         Ok(None)
///     }
///     async fn list_commits(&self, _repo: &RepoIdentity, _limit: usize) -> Result<Vec<RawCommit>> {
///         Ok(vec![])
///     }
///     async fn list_pull_requests(
///         &self,
///         _repo: &RepoIdentity,
///         _state: PrState,
///         _limit: usize,
///     ) -> Result<Vec<RawPullRequest>> {
///         Ok(vec![])
///     }
///     async fn list_pull_request_files(&self, _repo: &RepoIdentity, _number: u64) -> Result<Vec<FileChange>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Fetch the repository record for a numeric id.
    async fn get_repository(&self, id: RepoId) -> Result<RepoRecord>;

    /// List a directory or fetch a file. `path = ""` is the repository root.
    async fn get_entry(&self, repo: &RepoIdentity, path: &str) -> Result<Contents>;

    /// Fetch the README, `None` when the repository has none.
    async fn get_readme(&self, repo: &RepoIdentity) -> Result<Option<FileBlob>>;

    /// Most recent commits, newest first.
    async fn list_commits(&self, repo: &RepoIdentity, limit: usize) -> Result<Vec<RawCommit>>;

    /// Most recent pull requests in the given state.
    async fn list_pull_requests(
        &self,
        repo: &RepoIdentity,
        state: PrState,
        limit: usize,
    ) -> Result<Vec<RawPullRequest>>;

    /// Per-file change statistics of one pull request.
    async fn list_pull_request_files(
        &self,
        repo: &RepoIdentity,
        number: u64,
    ) -> Result<Vec<FileChange>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry_name_from_path() {
        let e = DirEntry::file("src/api/routes.py");
        assert_eq!(e.name, "routes.py");
        assert_eq!(e.kind, EntryKind::File);
        assert_eq!(DirEntry::dir("docs").name, "docs");
    }
}
