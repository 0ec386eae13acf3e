//! Bounded repository crawler.
//!
//! Walks a repository through the contents API and collects *important*
//! files (see [`is_important`]) with their content truncated to
//! `max_content_chars`. One [`CrawlBudget`] caps the total number of
//! collected files across the whole descent: once it is spent, no further
//! entry at any level is examined or fetched.
//!
//! # Traversal order
//!
//! Entries are visited in listing order. A subdirectory is expanded as
//! soon as it is reached, before its later siblings, so the result order
//! is the same as a recursive descent. The descent is driven by an
//! explicit stack of listings instead of call recursion.
//!
//! # Failures
//!
//! Crawling is best-effort. A file that cannot be fetched or decoded is
//! skipped, a subdirectory that cannot be listed is skipped, and a failed
//! root listing yields an empty result.

use tracing::{debug, warn};

use repo_context_core::classify::{is_important, truncate_owned};
use repo_context_core::models::{CrawlItem, RepoIdentity};
use repo_context_core::outcome::Fetched;

use crate::config::CrawlConfig;
use crate::fetcher::ContentFetcher;
use crate::host::{CodeHost, DirEntry, EntryKind};

/// Shared cap on the number of collected files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    limit: usize,
    used: usize,
}

impl CrawlBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    pub fn is_spent(&self) -> bool {
        self.used >= self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    pub fn used(&self) -> usize {
        self.used
    }

    fn record(&mut self) {
        self.used += 1;
    }
}

/// Everything a crawl observed.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Collected files in traversal order.
    pub items: Vec<CrawlItem>,
    /// Root listing, kept for callers that need a fallback overview.
    pub root: Fetched<Vec<DirEntry>>,
    /// Paths that were important but could not be fetched or had no content.
    pub failed_files: Vec<String>,
    /// Directories that could not be listed.
    pub failed_dirs: Vec<String>,
}

/// Crawls one repository. Each instance owns no mutable state; the budget
/// lives in the call.
pub struct RepositoryCrawler<'a> {
    fetcher: ContentFetcher<'a>,
    config: &'a CrawlConfig,
}

impl<'a> RepositoryCrawler<'a> {
    pub fn new(host: &'a dyn CodeHost, repo: &'a RepoIdentity, config: &'a CrawlConfig) -> Self {
        Self {
            fetcher: ContentFetcher::new(host, repo),
            config,
        }
    }

    /// Crawl from `root` (`""` for the repository root) with a fresh budget.
    pub async fn crawl(&self, root: &str) -> Vec<CrawlItem> {
        self.crawl_report(root).await.items
    }

    pub async fn crawl_report(&self, root: &str) -> CrawlReport {
        let mut budget = CrawlBudget::new(self.config.max_files);
        self.crawl_with_budget(root, &mut budget).await
    }

    /// Crawl from `root`, drawing from a caller-owned budget.
    pub async fn crawl_with_budget(&self, root: &str, budget: &mut CrawlBudget) -> CrawlReport {
        let repo = &self.fetcher.repo().full_name;
        let mut report = CrawlReport {
            items: Vec::new(),
            root: self.fetcher.list_dir(root).await,
            failed_files: Vec::new(),
            failed_dirs: Vec::new(),
        };

        let entries = match &report.root {
            Fetched::Ready(entries) => entries.clone(),
            Fetched::Omitted(reason) => {
                warn!(repo = %repo, root, %reason, "crawl aborted, root listing unavailable");
                return report;
            }
        };

        let mut pending: Vec<std::vec::IntoIter<DirEntry>> = vec![entries.into_iter()];

        while let Some(listing) = pending.last_mut() {
            if budget.is_spent() {
                debug!(repo = %repo, limit = budget.limit, "crawl budget spent");
                break;
            }
            let Some(entry) = listing.next() else {
                pending.pop();
                continue;
            };

            match entry.kind {
                EntryKind::File => {
                    if !is_important(&entry.name) {
                        continue;
                    }
                    match self.fetcher.file_text(&entry.path).await {
                        Fetched::Ready(text) => {
                            report.items.push(CrawlItem {
                                path: entry.path,
                                content: truncate_owned(text, self.config.max_content_chars),
                            });
                            budget.record();
                        }
                        Fetched::Omitted(_) => report.failed_files.push(entry.path),
                    }
                }
                EntryKind::Dir => {
                    if self.config.skip_dirs.iter().any(|d| d == &entry.name) {
                        debug!(repo = %repo, path = %entry.path, "skipping directory");
                        continue;
                    }
                    match self.fetcher.list_dir(&entry.path).await {
                        Fetched::Ready(children) => pending.push(children.into_iter()),
                        Fetched::Omitted(_) => report.failed_dirs.push(entry.path),
                    }
                }
                EntryKind::Other => {}
            }
        }

        debug!(
            repo = %repo,
            collected = report.items.len(),
            failed_files = report.failed_files.len(),
            failed_dirs = report.failed_dirs.len(),
            "crawl finished"
        );
        report
    }
}

/// Crawl a repository from its root and return its important files.
pub async fn crawl_important_files(
    host: &dyn CodeHost,
    repo: &RepoIdentity,
    config: &CrawlConfig,
) -> Vec<CrawlItem> {
    RepositoryCrawler::new(host, repo, config).crawl("").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedHost;

    fn repo() -> RepoIdentity {
        RepoIdentity::new("octo", "hello")
    }

    fn paths(items: &[CrawlItem]) -> Vec<&str> {
        items.iter().map(|i| i.path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_twenty_five_files_stops_at_twenty() {
        let mut host = ScriptedHost::new();
        for i in 0..25 {
            host = host.file(&format!("src/f{:02}.py", i), &"x".repeat(5000));
        }
        let config = CrawlConfig::default();
        let items = crawl_important_files(&host, &repo(), &config).await;

        assert_eq!(items.len(), 20);
        assert!(items.iter().all(|i| i.content.chars().count() == 4000));
        let fetched = host.fetched();
        for i in 20..25 {
            let p = format!("src/f{:02}.py", i);
            assert!(!fetched.contains(&p), "{} should not be fetched", p);
        }
    }

    #[tokio::test]
    async fn test_budget_shared_across_directories() {
        let host = ScriptedHost::new()
            .file("a/one.py", "1")
            .file("a/two.py", "2")
            .file("b/three.py", "3")
            .file("c/four.py", "4");
        let config = CrawlConfig {
            max_files: 3,
            ..Default::default()
        };
        let items = crawl_important_files(&host, &repo(), &config).await;
        assert_eq!(paths(&items), vec!["a/one.py", "a/two.py", "b/three.py"]);
        assert!(!host.fetched().contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn test_parent_listing_order_with_descent() {
        let host = ScriptedHost::new()
            .file("README.md", "# hi")
            .file("src/main.py", "print()")
            .file("src/lib/util.py", "pass")
            .file("setup.py", "setup()");
        let items = crawl_important_files(&host, &repo(), &CrawlConfig::default()).await;
        assert_eq!(
            paths(&items),
            vec!["README.md", "src/main.py", "src/lib/util.py", "setup.py"]
        );
    }

    #[tokio::test]
    async fn test_classification_filters_files() {
        let host = ScriptedHost::new()
            .file("src/app.rb", "puts 1")
            .file("src/app.py", "print(1)")
            .file("README.MD", "docs")
            .file("logo.png", "png")
            .symlink("link.py");
        let items = crawl_important_files(&host, &repo(), &CrawlConfig::default()).await;
        assert_eq!(paths(&items), vec!["src/app.py", "README.MD"]);
        assert!(!host.fetched().contains(&"src/app.rb".to_string()));
    }

    #[tokio::test]
    async fn test_root_listing_failure_is_empty() {
        let host = ScriptedHost::new().file("a.py", "1").fail("");
        let report = RepositoryCrawler::new(&host, &repo(), &CrawlConfig::default())
            .crawl_report("")
            .await;
        assert!(report.items.is_empty());
        assert!(!report.root.is_ready());
    }

    #[tokio::test]
    async fn test_partial_failures_are_skipped() {
        let host = ScriptedHost::new()
            .file("a.py", "a")
            .file("bad/x.py", "x")
            .file("b.py", "b")
            .file("c.py", "c")
            .fail("bad")
            .fail("b.py");
        let report = RepositoryCrawler::new(&host, &repo(), &CrawlConfig::default())
            .crawl_report("")
            .await;
        assert_eq!(paths(&report.items), vec!["a.py", "c.py"]);
        assert_eq!(report.failed_files, vec!["b.py".to_string()]);
        assert_eq!(report.failed_dirs, vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_consume_budget() {
        let host = ScriptedHost::new()
            .file("a.py", "a")
            .file("b.py", "b")
            .file("c.py", "c")
            .fail("a.py");
        let config = CrawlConfig {
            max_files: 2,
            ..Default::default()
        };
        let items = crawl_important_files(&host, &repo(), &config).await;
        assert_eq!(paths(&items), vec!["b.py", "c.py"]);
    }

    #[tokio::test]
    async fn test_files_without_content_cost_no_budget() {
        let host = ScriptedHost::new()
            .raw_file("dump.json", "", "none")
            .file("empty.py", "")
            .file("small.py", "x");
        let config = CrawlConfig {
            max_files: 1,
            ..Default::default()
        };
        let report = RepositoryCrawler::new(&host, &repo(), &config)
            .crawl_report("")
            .await;
        assert_eq!(paths(&report.items), vec!["small.py"]);
        assert_eq!(
            report.failed_files,
            vec!["dump.json".to_string(), "empty.py".to_string()]
        );
    }

    #[tokio::test]
    async fn test_skip_dirs_not_listed() {
        let host = ScriptedHost::new()
            .file("node_modules/left-pad/index.js", "x")
            .file("index.js", "y");
        let items = crawl_important_files(&host, &repo(), &CrawlConfig::default()).await;
        assert_eq!(paths(&items), vec!["index.js"]);
        assert!(!host.fetched().contains(&"node_modules".to_string()));

        let config = CrawlConfig {
            skip_dirs: vec![],
            ..Default::default()
        };
        let items = crawl_important_files(&host, &repo(), &config).await;
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_caller_budget_spans_crawls() {
        let host = ScriptedHost::new()
            .file("a/1.py", "1")
            .file("a/2.py", "2")
            .file("b/3.py", "3");
        let config = CrawlConfig::default();
        let repo = repo();
        let crawler = RepositoryCrawler::new(&host, &repo, &config);
        let mut budget = CrawlBudget::new(2);
        let first = crawler.crawl_with_budget("a", &mut budget).await;
        assert_eq!(first.items.len(), 2);
        assert!(budget.is_spent());
        let second = crawler.crawl_with_budget("b", &mut budget).await;
        assert!(second.items.is_empty());
        assert_eq!(budget.remaining(), 0);
    }
}
