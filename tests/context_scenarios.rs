//! End-to-end prompt assembly scenarios over an in-memory code host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use base64::Engine;
use repo_context::assistant::Assistant;
use repo_context::config::Config;
use repo_context::context::{ContextAssembler, Section};
use repo_context::crawler::crawl_important_files;
use repo_context::host::{
    CodeHost, Contents, DirEntry, FileBlob, PrState, RawCommit, RawPullRequest,
};
use repo_context::model::{LanguageModel, ModelError};
use repo_context::models::{FileChange, RepoId, RepoIdentity, RepoRecord};
use repo_context::store::memory::InMemoryStore;
use repo_context::store::{SessionStore, StoreError};

// ─── Test Host ──────────────────────────────────────────────────────

/// Flat-tree host: one root directory `pkg/` holding the given files.
struct TreeHost {
    files: Vec<(String, String)>,
    readme: Option<String>,
    pulls: Vec<RawPullRequest>,
    pr_files: HashMap<u64, Vec<FileChange>>,
    requests: Mutex<Vec<String>>,
}

impl TreeHost {
    fn new(files: Vec<(String, String)>) -> Self {
        Self {
            files,
            readme: None,
            pulls: Vec::new(),
            pr_files: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self, path: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|p| p == path)
    }
}

fn record() -> RepoRecord {
    RepoRecord {
        id: 9,
        owner: "acme".to_string(),
        name: "widgets".to_string(),
        full_name: "acme/widgets".to_string(),
        description: Some("Widget service".to_string()),
        language: Some("TypeScript".to_string()),
        stars: 120,
        forks: 4,
        open_issues: 3,
    }
}

#[async_trait]
impl CodeHost for TreeHost {
    async fn get_repository(&self, id: RepoId) -> Result<RepoRecord> {
        if id == 9 {
            Ok(record())
        } else {
            bail!("repository {} not found", id)
        }
    }

    async fn get_entry(&self, _repo: &RepoIdentity, path: &str) -> Result<Contents> {
        self.requests.lock().unwrap().push(path.to_string());
        match path {
            "" => Ok(Contents::Directory(vec![DirEntry::dir("pkg")])),
            "pkg" => Ok(Contents::Directory(
                self.files.iter().map(|(p, _)| DirEntry::file(p.clone())).collect(),
            )),
            _ => {
                let (_, body) = self
                    .files
                    .iter()
                    .find(|(p, _)| p == path)
                    .ok_or_else(|| anyhow!("404 {}", path))?;
                Ok(Contents::File(FileBlob {
                    path: path.to_string(),
                    content: base64::engine::general_purpose::STANDARD.encode(body),
                    encoding: "base64".to_string(),
                }))
            }
        }
    }

    async fn get_readme(&self, _repo: &RepoIdentity) -> Result<Option<FileBlob>> {
        Ok(self.readme.as_ref().map(|text| FileBlob {
            path: "README.md".to_string(),
            content: text.clone(),
            encoding: String::new(),
        }))
    }

    async fn list_commits(&self, _repo: &RepoIdentity, _limit: usize) -> Result<Vec<RawCommit>> {
        Ok(vec![RawCommit {
            sha: "abc".to_string(),
            message: Some("chore: bump deps".to_string()),
            author_name: None,
            date: None,
        }])
    }

    async fn list_pull_requests(
        &self,
        _repo: &RepoIdentity,
        _state: PrState,
        limit: usize,
    ) -> Result<Vec<RawPullRequest>> {
        Ok(self.pulls.iter().take(limit).cloned().collect())
    }

    async fn list_pull_request_files(
        &self,
        _repo: &RepoIdentity,
        number: u64,
    ) -> Result<Vec<FileChange>> {
        self.pr_files
            .get(&number)
            .cloned()
            .ok_or_else(|| anyhow!("502 for pull {}", number))
    }
}

struct FixedModel;

#[async_trait]
impl LanguageModel for FixedModel {
    fn model_name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Ok("ok".to_string())
    }
}

fn numbered_files(n: usize, ext: &str, size: usize) -> Vec<(String, String)> {
    (1..=n)
        .map(|i| (format!("pkg/mod{:02}.{}", i, ext), "z".repeat(size)))
        .collect()
}

// ─── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn crawl_caps_at_twenty_and_never_fetches_the_rest() {
    let host = TreeHost::new(numbered_files(25, "ts", 6000));
    let items = crawl_important_files(&host, &record().identity(), &Config::default().crawl).await;

    assert_eq!(items.len(), 20);
    assert!(items.iter().all(|i| i.content.chars().count() <= 4000));
    assert_eq!(items[19].path, "pkg/mod20.ts");
    for i in 21..=25 {
        assert!(!host.requested(&format!("pkg/mod{:02}.ts", i)));
    }
}

#[tokio::test]
async fn analysis_readme_excerpt_is_exactly_2000_chars() {
    let mut host = TreeHost::new(numbered_files(1, "py", 10));
    host.readme = Some("w".repeat(3000));
    let config = Config::default();
    let ctx = ContextAssembler::new(&host, &config)
        .assemble_analysis(&record())
        .await;

    let excerpt = ctx
        .text
        .split("README:\n")
        .nth(1)
        .and_then(|rest| rest.split('\n').next())
        .unwrap();
    assert_eq!(excerpt.chars().count(), 2000);
    assert!(ctx.text.contains("Commits:\n- chore: bump deps\n"));
}

#[tokio::test]
async fn analysis_lists_pr_whose_files_failed() {
    let mut host = TreeHost::new(numbered_files(2, "go", 10));
    host.pulls = vec![RawPullRequest {
        number: 31,
        title: Some("Speed up render".to_string()),
        state: Some("closed".to_string()),
        author: Some("dana".to_string()),
        merged_at: Some("2026-04-01T00:00:00Z".to_string()),
        ..Default::default()
    }];
    let config = Config::default();
    let text = ContextAssembler::new(&host, &config)
        .build_analysis_context(&record())
        .await;

    assert!(text.contains("- PR #31: Speed up render (State: closed, Author: dana, Merged: yes)"));
    assert!(!text.contains("Changed Files"));
}

#[tokio::test]
async fn chat_context_uses_last_five_turns() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = Assistant::new(Config::default(), Arc::new(FixedModel), store.clone(), store.clone());
    let host = TreeHost::new(Vec::new());
    let id = assistant.open_session("dev", Some(9), Some("Widgets")).await;

    // Four exchanges → eight turns
    for i in 0..4 {
        assistant
            .send_message(&host, id, &format!("q{}", i))
            .await
            .unwrap();
    }

    let session = store.get_session(id).await.unwrap();
    assert_eq!(session.messages.len(), 8);

    let config = Config::default();
    let ctx = ContextAssembler::new(&host, &config)
        .assemble_chat(&session, Some(&record()))
        .await;
    let history: Vec<&str> = ctx
        .text
        .split("=== Previous conversation ===\n")
        .nth(1)
        .unwrap()
        .lines()
        .collect();
    assert_eq!(
        history,
        vec!["assistant: ok", "user: q2", "assistant: ok", "user: q3", "assistant: ok"]
    );
    assert!(ctx.text.contains("Name: widgets"));
    assert!(ctx.text.contains("- chore: bump deps (by unknown, unknown)"));
    assert!(ctx.omission(Section::Readme).is_some());
}

#[tokio::test]
async fn append_to_unknown_session_touches_nothing() {
    let store = InMemoryStore::new();
    let a = store.create_session("dev", None, None).await;
    let b = store.create_session("dev", Some(9), None).await;

    let missing = a.max(b) + 1_000;
    let err = store
        .append_turn(missing, repo_context::models::ConversationTurn::user("x"))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::SessionNotFound(missing));
    assert!(store.get_messages(a).await.unwrap().is_empty());
    assert!(store.get_messages(b).await.unwrap().is_empty());
}

#[tokio::test]
async fn analysis_result_is_cached_per_repo() {
    let assistant = Assistant::in_memory(Config::default(), Arc::new(FixedModel));
    let host = TreeHost::new(numbered_files(3, "py", 50));

    let first = assistant.analyze(&host, 9).await.unwrap();
    let second = assistant.analyze(&host, 9).await.unwrap();
    assert!(second.generated_at >= first.generated_at);
    assert_eq!(assistant.analysis(9).await.unwrap(), second);
    assert_eq!(
        assistant.analysis(10).await.unwrap_err(),
        StoreError::AnalysisNotFound(10)
    );
}
