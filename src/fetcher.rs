//! Single-item retrieval over a [`CodeHost`].
//!
//! [`ContentFetcher`] wraps each host call in a [`Fetched`] outcome and
//! decodes file blobs from the host transport encoding, so callers never
//! see an error for a single missing item.

use base64::Engine;
use tracing::{debug, warn};

use repo_context_core::models::{FileChange, RepoIdentity};
use repo_context_core::outcome::{Fetched, OmitReason};

use crate::host::{CodeHost, Contents, DirEntry, FileBlob, PrState, RawCommit, RawPullRequest};

/// Decode a blob to text.
///
/// `base64` content may contain line breaks (GitHub wraps at 60 columns).
/// Invalid UTF-8 is replaced rather than rejected.
pub fn decode_blob(blob: &FileBlob) -> anyhow::Result<String> {
    if blob.encoding.eq_ignore_ascii_case("base64") {
        let compact: String = blob
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD.decode(compact.as_bytes())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Ok(blob.content.clone())
    }
}

/// Best-effort reader for one repository.
pub struct ContentFetcher<'a> {
    host: &'a dyn CodeHost,
    repo: &'a RepoIdentity,
}

impl<'a> ContentFetcher<'a> {
    pub fn new(host: &'a dyn CodeHost, repo: &'a RepoIdentity) -> Self {
        Self { host, repo }
    }

    pub fn repo(&self) -> &RepoIdentity {
        self.repo
    }

    /// List the directory at `path`. A file at `path` counts as a failure.
    pub async fn list_dir(&self, path: &str) -> Fetched<Vec<DirEntry>> {
        match self.host.get_entry(self.repo, path).await {
            Ok(Contents::Directory(entries)) => Fetched::Ready(entries),
            Ok(Contents::File(_)) => {
                warn!(repo = %self.repo.full_name, path, "expected a directory, got a file");
                Fetched::failed(format!("{} is not a directory", path))
            }
            Err(e) => {
                warn!(repo = %self.repo.full_name, path, error = %e, "failed to list directory");
                Fetched::failed(e.to_string())
            }
        }
    }

    /// Fetch and decode the file at `path`.
    ///
    /// A blob with no content comes back as [`OmitReason::Empty`]. GitHub
    /// serves files over 1 MB that way (`encoding: "none"`).
    pub async fn file_text(&self, path: &str) -> Fetched<String> {
        let blob = match self.host.get_entry(self.repo, path).await {
            Ok(Contents::File(blob)) => blob,
            Ok(Contents::Directory(_)) => {
                warn!(repo = %self.repo.full_name, path, "expected a file, got a directory");
                return Fetched::failed(format!("{} is a directory", path));
            }
            Err(e) => {
                warn!(repo = %self.repo.full_name, path, error = %e, "failed to fetch file");
                return Fetched::failed(e.to_string());
            }
        };
        if blob.content.is_empty() || blob.encoding.eq_ignore_ascii_case("none") {
            debug!(repo = %self.repo.full_name, path, encoding = %blob.encoding, "file has no inline content");
            return Fetched::Omitted(OmitReason::Empty);
        }
        match self.decode(&blob) {
            Fetched::Ready(text) if text.is_empty() => Fetched::Omitted(OmitReason::Empty),
            other => other,
        }
    }

    /// Fetch and decode the README.
    pub async fn readme_text(&self) -> Fetched<String> {
        match self.host.get_readme(self.repo).await {
            Ok(Some(blob)) => match self.decode(&blob) {
                Fetched::Ready(text) if text.trim().is_empty() => {
                    Fetched::Omitted(OmitReason::Empty)
                }
                other => other,
            },
            Ok(None) => Fetched::Omitted(OmitReason::Empty),
            Err(e) => {
                warn!(repo = %self.repo.full_name, error = %e, "failed to fetch README");
                Fetched::failed(e.to_string())
            }
        }
    }

    pub async fn commits(&self, limit: usize) -> Fetched<Vec<RawCommit>> {
        let result = self.host.list_commits(self.repo, limit).await;
        if let Err(e) = &result {
            warn!(repo = %self.repo.full_name, error = %e, "failed to list commits");
        }
        Fetched::from_result(result)
    }

    pub async fn pull_requests(&self, state: PrState, limit: usize) -> Fetched<Vec<RawPullRequest>> {
        let result = self.host.list_pull_requests(self.repo, state, limit).await;
        if let Err(e) = &result {
            warn!(repo = %self.repo.full_name, error = %e, "failed to list pull requests");
        }
        Fetched::from_result(result)
    }

    pub async fn pull_request_files(&self, number: u64) -> Fetched<Vec<FileChange>> {
        let result = self.host.list_pull_request_files(self.repo, number).await;
        if let Err(e) = &result {
            warn!(repo = %self.repo.full_name, pr = number, error = %e, "failed to list pull request files");
        }
        Fetched::from_result(result)
    }

    fn decode(&self, blob: &FileBlob) -> Fetched<String> {
        match decode_blob(blob) {
            Ok(text) => Fetched::Ready(text),
            Err(e) => {
                warn!(repo = %self.repo.full_name, path = %blob.path, error = %e, "failed to decode content");
                Fetched::failed(format!("decode {}: {}", blob.path, e))
            }
        }
    }
}
