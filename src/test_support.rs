//! Scripted in-memory [`CodeHost`] for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use base64::Engine;

use repo_context_core::models::{FileChange, RepoId, RepoIdentity, RepoRecord};

use crate::host::{
    CodeHost, Contents, DirEntry, EntryKind, FileBlob, PrState, RawCommit, RawPullRequest,
};

pub fn record() -> RepoRecord {
    RepoRecord {
        id: 42,
        owner: "octo".to_string(),
        name: "hello".to_string(),
        full_name: "octo/hello".to_string(),
        description: Some("A test repository".to_string()),
        language: Some("Python".to_string()),
        stars: 7,
        forks: 2,
        open_issues: 1,
    }
}

pub fn commit(message: &str) -> RawCommit {
    RawCommit {
        sha: format!("sha-{}", message.len()),
        message: Some(message.to_string()),
        author_name: Some("alice".to_string()),
        date: Some("2026-01-02T03:04:05Z".to_string()),
    }
}

pub fn pull(number: u64, title: &str) -> RawPullRequest {
    RawPullRequest {
        number,
        title: Some(title.to_string()),
        state: Some("open".to_string()),
        author: Some("bob".to_string()),
        created_at: Some("2026-01-01T00:00:00Z".to_string()),
        updated_at: Some("2026-01-03T00:00:00Z".to_string()),
        merged_at: None,
    }
}

#[derive(Default)]
pub struct ScriptedHost {
    repo: Option<RepoRecord>,
    dirs: HashMap<String, Vec<DirEntry>>,
    files: HashMap<String, FileBlob>,
    failing: HashSet<String>,
    readme: Option<String>,
    readme_fails: bool,
    commits: Option<Vec<RawCommit>>,
    pulls: Option<Vec<RawPullRequest>>,
    pr_files: HashMap<u64, Vec<FileChange>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        let mut host = Self {
            repo: Some(record()),
            commits: Some(Vec::new()),
            pulls: Some(Vec::new()),
            ..Default::default()
        };
        host.dirs.insert(String::new(), Vec::new());
        host
    }

    fn ensure_dir(&mut self, path: &str) {
        if self.dirs.contains_key(path) {
            return;
        }
        self.dirs.insert(path.to_string(), Vec::new());
        let parent = parent_of(path);
        self.ensure_dir(&parent);
        if let Some(listing) = self.dirs.get_mut(&parent) {
            listing.push(DirEntry::dir(path));
        }
    }

    /// Add a file, creating parent listings in insertion order.
    pub fn file(mut self, path: &str, content: &str) -> Self {
        let parent = parent_of(path);
        self.ensure_dir(&parent);
        if let Some(listing) = self.dirs.get_mut(&parent) {
            listing.push(DirEntry::file(path));
        }
        self.files.insert(
            path.to_string(),
            FileBlob {
                path: path.to_string(),
                content: encode(content),
                encoding: "base64".to_string(),
            },
        );
        self
    }

    /// Add a file served with the given transport encoding, untouched.
    pub fn raw_file(mut self, path: &str, content: &str, encoding: &str) -> Self {
        self = self.file(path, "");
        self.files.insert(
            path.to_string(),
            FileBlob {
                path: path.to_string(),
                content: content.to_string(),
                encoding: encoding.to_string(),
            },
        );
        self
    }

    pub fn symlink(mut self, path: &str) -> Self {
        let parent = parent_of(path);
        self.ensure_dir(&parent);
        if let Some(listing) = self.dirs.get_mut(&parent) {
            let mut entry = DirEntry::file(path);
            entry.kind = EntryKind::Other;
            listing.push(entry);
        }
        self
    }

    /// Make `get_entry` fail for this path.
    pub fn fail(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn without_repo(mut self) -> Self {
        self.repo = None;
        self
    }

    pub fn readme(mut self, text: &str) -> Self {
        self.readme = Some(text.to_string());
        self
    }

    pub fn readme_fails(mut self) -> Self {
        self.readme_fails = true;
        self
    }

    pub fn commits(mut self, commits: Vec<RawCommit>) -> Self {
        self.commits = Some(commits);
        self
    }

    pub fn commits_fail(mut self) -> Self {
        self.commits = None;
        self
    }

    pub fn pulls(mut self, pulls: Vec<RawPullRequest>) -> Self {
        self.pulls = Some(pulls);
        self
    }

    pub fn pulls_fail(mut self) -> Self {
        self.pulls = None;
        self
    }

    /// PR numbers without files here fail their file listing.
    pub fn pr_files(mut self, number: u64, files: Vec<FileChange>) -> Self {
        self.pr_files.insert(number, files);
        self
    }

    /// Every `get_entry` path requested, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn encode(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}

#[async_trait]
impl CodeHost for ScriptedHost {
    async fn get_repository(&self, id: RepoId) -> Result<RepoRecord> {
        match &self.repo {
            Some(r) if r.id == id => Ok(r.clone()),
            _ => bail!("repository {} not found", id),
        }
    }

    async fn get_entry(&self, _repo: &RepoIdentity, path: &str) -> Result<Contents> {
        self.log.lock().unwrap().push(path.to_string());
        if self.failing.contains(path) {
            bail!("GitHub API error 500 for {}", path);
        }
        if let Some(entries) = self.dirs.get(path) {
            return Ok(Contents::Directory(entries.clone()));
        }
        let blob = self
            .files
            .get(path)
            .ok_or_else(|| anyhow!("GitHub API error 404 for {}", path))?;
        Ok(Contents::File(blob.clone()))
    }

    async fn get_readme(&self, _repo: &RepoIdentity) -> Result<Option<FileBlob>> {
        if self.readme_fails {
            bail!("GitHub API error 502 for readme");
        }
        Ok(self.readme.as_ref().map(|text| FileBlob {
            path: "README.md".to_string(),
            content: encode(text),
            encoding: "base64".to_string(),
        }))
    }

    async fn list_commits(&self, _repo: &RepoIdentity, limit: usize) -> Result<Vec<RawCommit>> {
        match &self.commits {
            Some(c) => Ok(c.iter().take(limit).cloned().collect()),
            None => bail!("GitHub API error 500 for commits"),
        }
    }

    async fn list_pull_requests(
        &self,
        _repo: &RepoIdentity,
        _state: PrState,
        limit: usize,
    ) -> Result<Vec<RawPullRequest>> {
        match &self.pulls {
            Some(p) => Ok(p.iter().take(limit).cloned().collect()),
            None => bail!("GitHub API error 500 for pulls"),
        }
    }

    async fn list_pull_request_files(
        &self,
        _repo: &RepoIdentity,
        number: u64,
    ) -> Result<Vec<FileChange>> {
        self.pr_files
            .get(&number)
            .cloned()
            .ok_or_else(|| anyhow!("GitHub API error 500 for pull {} files", number))
    }
}
