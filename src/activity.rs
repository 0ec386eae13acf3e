//! Recent commit and pull request aggregation.
//!
//! Upstream gaps are defaulted: a missing author becomes `"unknown"`, a
//! missing commit message `"no message"`, a missing date `"unknown"`.
//! A failed list call degrades to an omitted section; a failed per-PR
//! file listing leaves that PR without change detail.

use tracing::debug;

use repo_context_core::models::{ActivitySummary, CommitSummary, PullRequestSummary, UNKNOWN};
use repo_context_core::outcome::Fetched;

use crate::fetcher::ContentFetcher;
use crate::host::{PrState, RawCommit, RawPullRequest};

const NO_MESSAGE: &str = "no message";

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

impl From<RawCommit> for CommitSummary {
    fn from(c: RawCommit) -> Self {
        CommitSummary {
            message: or_default(c.message, NO_MESSAGE),
            author_name: or_default(c.author_name, UNKNOWN),
            date: or_default(c.date, UNKNOWN),
        }
    }
}

fn summarize_pull(p: RawPullRequest) -> PullRequestSummary {
    PullRequestSummary {
        number: p.number,
        title: or_default(p.title, "untitled"),
        state: or_default(p.state, UNKNOWN),
        author: or_default(p.author, UNKNOWN),
        created_at: or_default(p.created_at, UNKNOWN),
        updated_at: or_default(p.updated_at, UNKNOWN),
        merged: p.merged_at.is_some(),
        changed_files: None,
    }
}

/// Fetches recent activity for one repository.
pub struct ActivityAggregator<'a> {
    fetcher: &'a ContentFetcher<'a>,
}

impl<'a> ActivityAggregator<'a> {
    pub fn new(fetcher: &'a ContentFetcher<'a>) -> Self {
        Self { fetcher }
    }

    /// Up to `limit` commits, newest first as the host orders them.
    pub async fn recent_commits(&self, limit: usize) -> Fetched<Vec<CommitSummary>> {
        self.fetcher
            .commits(limit)
            .await
            .map(|commits| {
                commits
                    .into_iter()
                    .take(limit)
                    .map(CommitSummary::from)
                    .collect::<Vec<_>>()
            })
            .non_empty()
    }

    /// Up to `limit` pull requests in any state, each with its changed files
    /// when `with_files` is set.
    pub async fn recent_pull_requests(
        &self,
        limit: usize,
        with_files: bool,
    ) -> Fetched<Vec<PullRequestSummary>> {
        let pulls = match self.fetcher.pull_requests(PrState::All, limit).await.non_empty() {
            Fetched::Ready(p) => p,
            Fetched::Omitted(reason) => return Fetched::Omitted(reason),
        };

        let mut summaries = Vec::with_capacity(pulls.len().min(limit));
        for raw in pulls.into_iter().take(limit) {
            let mut summary = summarize_pull(raw);
            if with_files {
                summary.changed_files = self.fetcher.pull_request_files(summary.number).await.ready();
            }
            summaries.push(summary);
        }
        debug!(
            repo = %self.fetcher.repo().full_name,
            pulls = summaries.len(),
            "pull requests aggregated"
        );
        Fetched::Ready(summaries)
    }

    /// Commits and pull requests together, with per-PR file detail.
    pub async fn summary(&self, commit_limit: usize, pr_limit: usize) -> ActivitySummary {
        ActivitySummary {
            commits: self.recent_commits(commit_limit).await.unwrap_or_empty(),
            pull_requests: self
                .recent_pull_requests(pr_limit, true)
                .await
                .unwrap_or_empty(),
        }
    }
}
