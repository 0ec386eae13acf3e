//! GitHub REST API adapter.
//!
//! Implements [`CodeHost`] over `api.github.com` (or any compatible
//! endpoint configured in `[github].api_url`) with a per-request access
//! token.
//!
//! # Endpoints
//!
//! | Operation | Path |
//! |-----------|------|
//! | [`get_repository`](CodeHost::get_repository) | `GET /repositories/{id}` |
//! | [`get_entry`](CodeHost::get_entry) | `GET /repos/{owner}/{repo}/contents/{path}` |
//! | [`get_readme`](CodeHost::get_readme) | `GET /repos/{owner}/{repo}/readme` |
//! | [`list_commits`](CodeHost::list_commits) | `GET /repos/{owner}/{repo}/commits?per_page=N` |
//! | [`list_pull_requests`](CodeHost::list_pull_requests) | `GET /repos/{owner}/{repo}/pulls?state=S&per_page=N` |
//! | [`list_pull_request_files`](CodeHost::list_pull_request_files) | `GET /repos/{owner}/{repo}/pulls/{n}/files` |
//!
//! Non-2xx responses are returned as errors; nothing is retried.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use repo_context_core::models::{FileChange, RepoId, RepoIdentity, RepoRecord};

use crate::config::GitHubConfig;
use crate::host::{
    CodeHost, Contents, DirEntry, EntryKind, FileBlob, PrState, RawCommit, RawPullRequest,
};

/// GitHub client bound to one user's access token.
pub struct GitHubClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl GitHubClient {
    /// Build a client from configuration and an OAuth access token.
    pub fn new(config: &GitHubConfig, token: impl Into<String>) -> Result<Self> {
        let base = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid github.api_url: {}", config.api_url))?;
        if base.cannot_be_a_base() {
            bail!("github.api_url cannot be used as a base URL: {}", config.api_url);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            base,
            token: token.into(),
        })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments.into_iter().filter(|s| !s.is_empty()));
        }
        url
    }

    fn repo_url<'a>(&self, repo: &'a RepoIdentity, rest: &[&'a str]) -> Url {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str()];
        segments.extend_from_slice(rest);
        self.url(segments)
    }

    async fn send(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url.clone())
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("GitHub request failed: {}", url))?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let response = self.send(url.clone(), query).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("GitHub API error {} for {}: {}", status, url, body);
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("Invalid GitHub response from {}", url))
    }
}

// ============ Wire formats ============

#[derive(Deserialize)]
struct WireOwner {
    login: String,
}

#[derive(Deserialize)]
struct WireRepo {
    id: RepoId,
    name: String,
    full_name: String,
    owner: WireOwner,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
}

#[derive(Deserialize)]
struct WireEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct WireFile {
    path: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireContents {
    Directory(Vec<WireEntry>),
    File(WireFile),
}

#[derive(Deserialize)]
struct WireCommitAuthor {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Deserialize)]
struct WireCommitDetail {
    message: Option<String>,
    author: Option<WireCommitAuthor>,
}

#[derive(Deserialize)]
struct WireCommit {
    #[serde(default)]
    sha: String,
    commit: Option<WireCommitDetail>,
}

#[derive(Deserialize)]
struct WirePull {
    number: u64,
    title: Option<String>,
    state: Option<String>,
    user: Option<WireOwner>,
    created_at: Option<String>,
    updated_at: Option<String>,
    merged_at: Option<String>,
}

#[derive(Deserialize)]
struct WirePullFile {
    filename: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

impl From<WireFile> for FileBlob {
    fn from(f: WireFile) -> Self {
        FileBlob {
            path: f.path,
            content: f.content.unwrap_or_default(),
            encoding: f.encoding.unwrap_or_default(),
        }
    }
}

fn entry_kind(kind: &str) -> EntryKind {
    match kind {
        "file" => EntryKind::File,
        "dir" => EntryKind::Dir,
        _ => EntryKind::Other,
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn get_repository(&self, id: RepoId) -> Result<RepoRecord> {
        let id_str = id.to_string();
        let repo: WireRepo = self.get_json(self.url(["repositories", id_str.as_str()]), &[]).await?;
        Ok(RepoRecord {
            id: repo.id,
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
        })
    }

    async fn get_entry(&self, repo: &RepoIdentity, path: &str) -> Result<Contents> {
        let mut rest = vec!["contents"];
        rest.extend(path.split('/'));
        let contents: WireContents = self.get_json(self.repo_url(repo, &rest), &[]).await?;
        Ok(match contents {
            WireContents::Directory(entries) => Contents::Directory(
                entries
                    .into_iter()
                    .map(|e| DirEntry {
                        kind: entry_kind(&e.kind),
                        name: e.name,
                        path: e.path,
                    })
                    .collect(),
            ),
            WireContents::File(file) => Contents::File(file.into()),
        })
    }

    async fn get_readme(&self, repo: &RepoIdentity) -> Result<Option<FileBlob>> {
        let url = self.repo_url(repo, &["readme"]);
        let response = self.send(url.clone(), &[]).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            bail!("GitHub API error {} for {}", status, url);
        }
        let file: WireFile = response
            .json()
            .await
            .with_context(|| format!("Invalid GitHub response from {}", url))?;
        Ok(Some(file.into()))
    }

    async fn list_commits(&self, repo: &RepoIdentity, limit: usize) -> Result<Vec<RawCommit>> {
        let commits: Vec<WireCommit> = self
            .get_json(
                self.repo_url(repo, &["commits"]),
                &[("per_page", limit.to_string())],
            )
            .await?;
        Ok(commits
            .into_iter()
            .take(limit)
            .map(|c| {
                let (message, author) = match c.commit {
                    Some(d) => (d.message, d.author),
                    None => (None, None),
                };
                let (author_name, date) = match author {
                    Some(a) => (a.name, a.date),
                    None => (None, None),
                };
                RawCommit {
                    sha: c.sha,
                    message,
                    author_name,
                    date,
                }
            })
            .collect())
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoIdentity,
        state: PrState,
        limit: usize,
    ) -> Result<Vec<RawPullRequest>> {
        let pulls: Vec<WirePull> = self
            .get_json(
                self.repo_url(repo, &["pulls"]),
                &[
                    ("state", state.as_str().to_string()),
                    ("per_page", limit.to_string()),
                ],
            )
            .await?;
        Ok(pulls
            .into_iter()
            .take(limit)
            .map(|p| RawPullRequest {
                number: p.number,
                title: p.title,
                state: p.state,
                author: p.user.map(|u| u.login),
                created_at: p.created_at,
                updated_at: p.updated_at,
                merged_at: p.merged_at,
            })
            .collect())
    }

    async fn list_pull_request_files(
        &self,
        repo: &RepoIdentity,
        number: u64,
    ) -> Result<Vec<FileChange>> {
        let number = number.to_string();
        let files: Vec<WirePullFile> = self
            .get_json(self.repo_url(repo, &["pulls", number.as_str(), "files"]), &[])
            .await?;
        Ok(files
            .into_iter()
            .map(|f| FileChange {
                name: f.filename,
                additions: f.additions,
                deletions: f.deletions,
            })
            .collect())
    }
}
