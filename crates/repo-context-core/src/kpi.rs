//! Productivity indicators derived from recent activity.
//!
//! Computed from the same [`ActivitySummary`] the analysis prompt renders,
//! so they cost no extra upstream calls.
//!
//! | Component | Weight | Full marks at |
//! |-----------|--------|---------------|
//! | commit activity | 40% | 10 commits |
//! | PR merge rate | 30% | 100% merged (50 when there are no PRs) |
//! | contributors | 30% | 5 distinct commit authors |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{ActivitySummary, UNKNOWN};

const FULL_COMMITS: f64 = 10.0;
const FULL_CONTRIBUTORS: f64 = 5.0;
const NO_PR_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityKpis {
    /// Weighted 0–100 score.
    pub productivity_score: f64,
    /// Commits in the recent window.
    pub commit_frequency: usize,
    /// Percentage of recent pull requests that were merged.
    pub pr_merge_rate: f64,
    /// Distinct named commit authors.
    pub active_contributors: usize,
}

impl ProductivityKpis {
    pub fn from_activity(activity: &ActivitySummary) -> Self {
        let commits = activity.commits.len();
        let pulls = activity.pull_requests.len();
        if commits == 0 && pulls == 0 {
            return Self::default();
        }

        let merged = activity.pull_requests.iter().filter(|p| p.merged).count();
        let merge_rate = if pulls > 0 {
            merged as f64 / pulls as f64 * 100.0
        } else {
            0.0
        };

        let contributors: HashSet<&str> = activity
            .commits
            .iter()
            .map(|c| c.author_name.as_str())
            .filter(|a| *a != UNKNOWN)
            .collect();

        let commit_score = (commits as f64 / FULL_COMMITS * 100.0).min(100.0);
        let pr_score = if pulls > 0 { merge_rate } else { NO_PR_SCORE };
        let contributor_score = (contributors.len() as f64 / FULL_CONTRIBUTORS * 100.0).min(100.0);

        Self {
            productivity_score: round1(commit_score * 0.4 + pr_score * 0.3 + contributor_score * 0.3),
            commit_frequency: commits,
            pr_merge_rate: round1(merge_rate),
            active_contributors: contributors.len(),
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
