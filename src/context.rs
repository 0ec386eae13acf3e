//! Prompt context assembly.
//!
//! Two policies share the same section renderers:
//!
//! | Policy | Sections |
//! |--------|----------|
//! | Chat | preamble, repository, README (1000 chars), commits, pull requests with changed files, last 5 turns |
//! | Analysis | repository, README (2000 chars), crawled files or top-level listing, commit headlines, pull request states, closing instruction |
//!
//! Assembly never fails. Each section comes from a [`Fetched`] outcome;
//! an omitted section is recorded in [`AssembledContext::omitted`] with its
//! reason and left out of the text. There is no global size cap beyond the
//! per-section truncation, so callers with a token budget should treat the
//! result as a soft bound.

use std::fmt::Write as _;

use repo_context_core::classify::truncate_chars;
use repo_context_core::models::{
    ActivitySummary, ChatSession, CommitSummary, ConversationTurn, CrawlItem, PullRequestSummary,
    RepoRecord,
};
use repo_context_core::outcome::{Fetched, OmitReason};

use crate::activity::ActivityAggregator;
use crate::config::Config;
use crate::crawler::RepositoryCrawler;
use crate::fetcher::ContentFetcher;
use crate::host::{CodeHost, DirEntry};

/// Opening instruction of every chat prompt.
pub const CHAT_PREAMBLE: &str = "You are an expert AI coding assistant helping developers understand their GitHub repositories. You have deep knowledge of the codebase, recent activity, and pull requests.";

/// Closing instruction of every analysis prompt.
pub const ANALYSIS_INSTRUCTIONS: &str = "Based on the repository information above, provide a detailed evaluation with these sections:
1. Code Quality Score (1-10, with justification)
2. Architecture Overview (patterns, structure, design decisions)
3. Security Considerations (vulnerabilities, risky practices)
4. Performance Insights (bottlenecks, optimization opportunities)
5. Improvement Suggestions (prioritized, actionable)";

/// Prompt sections that may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Repository,
    Readme,
    Files,
    Commits,
    PullRequests,
    History,
}

/// Assembled prompt text plus the sections that were left out.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub omitted: Vec<(Section, OmitReason)>,
    /// Commits and pull requests the prompt was built from. Empty for an
    /// omitted section.
    pub activity: ActivitySummary,
}

impl AssembledContext {
    fn new(text: String) -> Self {
        Self {
            text,
            omitted: Vec::new(),
            activity: ActivitySummary::default(),
        }
    }

    fn keep_commits(&mut self, commits: &Fetched<Vec<CommitSummary>>) {
        if let Fetched::Ready(c) = commits {
            self.activity.commits = c.clone();
        }
    }

    fn keep_pulls(&mut self, pulls: &Fetched<Vec<PullRequestSummary>>) {
        if let Fetched::Ready(p) = pulls {
            self.activity.pull_requests = p.clone();
        }
    }

    /// Why `section` was left out, if it was.
    pub fn omission(&self, section: Section) -> Option<&OmitReason> {
        self.omitted
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, r)| r)
    }

    /// Append `render(data)` for a ready section, or record the omission.
    fn push<T>(&mut self, section: Section, fetched: Fetched<T>, render: impl FnOnce(&mut String, T)) {
        match fetched {
            Fetched::Ready(data) => render(&mut self.text, data),
            Fetched::Omitted(reason) => {
                tracing::debug!(?section, %reason, "section omitted");
                self.omitted.push((section, reason));
            }
        }
    }
}

// ============ Section renderers ============

fn render_identity(out: &mut String, repo: &RepoRecord, chat: bool) {
    let description = repo.description.as_deref().unwrap_or("No description");
    let language = repo.language.as_deref().unwrap_or("Unknown");
    if chat {
        out.push_str("\n\n=== REPOSITORY CONTEXT ===\n");
        let _ = writeln!(out, "Name: {}", repo.name);
    } else {
        let _ = writeln!(out, "Repository: {}", repo.full_name);
    }
    let _ = writeln!(out, "Description: {}", description);
    let _ = writeln!(out, "Language: {}", language);
    let _ = writeln!(out, "Stars: {}", repo.stars);
    let _ = writeln!(out, "Forks: {}", repo.forks);
    if chat {
        let _ = writeln!(out, "Open Issues: {}", repo.open_issues);
    }
}

fn render_readme(out: &mut String, heading: &str, text: &str, max_chars: usize) {
    let _ = write!(out, "\n{}\n{}\n", heading, truncate_chars(text, max_chars));
}

fn render_commits_chat(out: &mut String, commits: &[CommitSummary]) {
    out.push_str("\n=== Recent Commits ===\n");
    for c in commits {
        let _ = writeln!(out, "- {} (by {}, {})", c.headline(), c.author_name, c.date);
    }
}

fn render_pulls_chat(out: &mut String, pulls: &[PullRequestSummary], files_limit: usize) {
    out.push_str("\n=== Recent Pull Requests ===\n");
    for pr in pulls {
        let _ = writeln!(out, "- PR #{}: {}", pr.number, pr.title);
        let _ = writeln!(out, "  State: {}, Author: {}", pr.state, pr.author);
        let _ = writeln!(out, "  Created: {}, Updated: {}", pr.created_at, pr.updated_at);
        let _ = writeln!(out, "  Merged: {}", if pr.merged { "yes" } else { "no" });
        if let Some(files) = pr.changed_files.as_deref().filter(|f| !f.is_empty()) {
            out.push_str("  Changed Files:\n");
            for f in files.iter().take(files_limit) {
                let _ = writeln!(out, "    - {} (+{}/-{})", f.name, f.additions, f.deletions);
            }
            if files.len() > files_limit {
                let _ = writeln!(out, "    ... and {} more files", files.len() - files_limit);
            }
        }
    }
}

fn render_history(out: &mut String, turns: &[ConversationTurn]) {
    out.push_str("\n=== Previous conversation ===\n");
    for t in turns {
        let _ = writeln!(out, "{}: {}", t.role, t.content);
    }
}

fn render_files(out: &mut String, items: &[CrawlItem]) {
    let _ = writeln!(out, "\n=== CODE FILES ({} files analyzed) ===", items.len());
    for item in items {
        let _ = write!(
            out,
            "\n===== FILE: {} =====\n{}\n===== END FILE: {} =====\n",
            item.path, item.content, item.path
        );
    }
}

fn render_top_level(out: &mut String, entries: &[DirEntry], limit: usize) {
    let names: Vec<&str> = entries.iter().take(limit).map(|e| e.name.as_str()).collect();
    out.push_str("\n=== REPOSITORY STRUCTURE ===\n");
    let _ = writeln!(out, "Top-level entries: {}", names.join(", "));
}

fn render_commits_analysis(out: &mut String, commits: &[CommitSummary]) {
    out.push_str("\nRecent Commits:\n");
    for c in commits {
        let _ = writeln!(out, "- {}", c.headline());
    }
}

fn render_pulls_analysis(out: &mut String, pulls: &[PullRequestSummary]) {
    out.push_str("\nRecent Pull Requests:\n");
    for pr in pulls {
        let _ = writeln!(
            out,
            "- PR #{}: {} (State: {}, Author: {}, Merged: {})",
            pr.number,
            pr.title,
            pr.state,
            pr.author,
            if pr.merged { "yes" } else { "no" }
        );
    }
}

// ============ Assembler ============

/// Builds chat and analysis prompts from a code host.
pub struct ContextAssembler<'a> {
    host: &'a dyn CodeHost,
    config: &'a Config,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(host: &'a dyn CodeHost, config: &'a Config) -> Self {
        Self { host, config }
    }

    /// Chat prompt for `session`. `repo` is the session's resolved
    /// repository, `None` when the session has none or it could not be
    /// resolved.
    pub async fn assemble_chat(
        &self,
        session: &ChatSession,
        repo: Option<&RepoRecord>,
    ) -> AssembledContext {
        let limits = &self.config.context;
        let mut ctx = AssembledContext::new(CHAT_PREAMBLE.to_string());

        match repo {
            Some(record) => {
                render_identity(&mut ctx.text, record, true);

                let identity = record.identity();
                let fetcher = ContentFetcher::new(self.host, &identity);
                let activity = ActivityAggregator::new(&fetcher);

                let readme = fetcher.readme_text().await;
                ctx.push(Section::Readme, readme, |out, text| {
                    let heading = format!(
                        "=== README (first {} chars) ===",
                        limits.chat_readme_chars
                    );
                    render_readme(out, &heading, &text, limits.chat_readme_chars)
                });

                let commits = activity.recent_commits(limits.commit_limit).await;
                ctx.keep_commits(&commits);
                ctx.push(Section::Commits, commits, |out, c| {
                    render_commits_chat(out, &c)
                });

                let pulls = activity
                    .recent_pull_requests(limits.pull_request_limit, true)
                    .await;
                ctx.keep_pulls(&pulls);
                ctx.push(Section::PullRequests, pulls, |out, p| {
                    render_pulls_chat(out, &p, limits.pr_files_limit)
                });
            }
            None => {
                let reason = match session.repo_id {
                    Some(id) => OmitReason::Failed(format!("repository {} unavailable", id)),
                    None => OmitReason::NotLinked,
                };
                for section in [
                    Section::Repository,
                    Section::Readme,
                    Section::Commits,
                    Section::PullRequests,
                ] {
                    ctx.omitted.push((section, reason.clone()));
                }
            }
        }

        let turns = session.recent_turns(limits.history_turns);
        let history = if turns.is_empty() {
            Fetched::Omitted(OmitReason::Empty)
        } else {
            Fetched::Ready(turns)
        };
        ctx.push(Section::History, history, render_history);

        ctx
    }

    pub async fn build_chat_context(
        &self,
        session: &ChatSession,
        repo: Option<&RepoRecord>,
    ) -> String {
        self.assemble_chat(session, repo).await.text
    }

    /// Analysis prompt for `repo`.
    pub async fn assemble_analysis(&self, repo: &RepoRecord) -> AssembledContext {
        let limits = &self.config.context;
        let identity = repo.identity();
        let fetcher = ContentFetcher::new(self.host, &identity);
        let activity = ActivityAggregator::new(&fetcher);

        let mut ctx =
            AssembledContext::new("Analyze this GitHub repository comprehensively:\n\n".to_string());
        render_identity(&mut ctx.text, repo, false);

        let readme = fetcher.readme_text().await;
        ctx.push(Section::Readme, readme, |out, text| {
            render_readme(out, "README:", &text, limits.analysis_readme_chars)
        });

        let report = RepositoryCrawler::new(self.host, &identity, &self.config.crawl)
            .crawl_report("")
            .await;
        if report.items.is_empty() {
            let fallback = report.root.non_empty();
            ctx.push(Section::Files, fallback, |out, entries| {
                render_top_level(out, &entries, limits.fallback_entries)
            });
        } else {
            render_files(&mut ctx.text, &report.items);
        }

        let commits = activity.recent_commits(limits.commit_limit).await;
        ctx.keep_commits(&commits);
        ctx.push(Section::Commits, commits, |out, c| {
            render_commits_analysis(out, &c)
        });

        let pulls = activity
            .recent_pull_requests(limits.pull_request_limit, false)
            .await;
        ctx.keep_pulls(&pulls);
        ctx.push(Section::PullRequests, pulls, |out, p| {
            render_pulls_analysis(out, &p)
        });

        ctx.text.push_str("\n\n");
        ctx.text.push_str(ANALYSIS_INSTRUCTIONS);
        ctx.text.push('\n');
        ctx
    }

    pub async fn build_analysis_context(&self, repo: &RepoRecord) -> String {
        self.assemble_analysis(repo).await.text
    }
}
