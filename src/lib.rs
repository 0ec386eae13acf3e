//! # repo-context
//!
//! Bounded repository crawling and prompt-context assembly for AI code
//! assistants.
//!
//! repo-context pulls files, README, commits, pull requests, and prior
//! conversation turns from a code-hosting API and folds them into a
//! size-bounded prompt for a language model. Every upstream call is
//! best-effort: a failed item or section is left out and assembly goes on.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────────┐   ┌───────────┐
//! │  CodeHost  │──▶│ContentFetcher│──▶│ Crawler/Activity │──▶│ Assembler │
//! │  (GitHub)  │   │ decode+wrap  │   │ budget, defaults │   │chat/analyz│
//! └────────────┘   └──────────────┘   └──────────────────┘   └─────┬─────┘
//!                                                                  │
//!                              ┌──────────────┐   ┌────────────┐   │
//!                              │Session/Cache │◀──│ Assistant  │◀──┘
//!                              │   stores     │   │ + LLM call │
//!                              └──────────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`host`] | Code-host adapter trait and wire types |
//! | [`github`] | GitHub REST implementation of [`host::CodeHost`] |
//! | [`fetcher`] | Single-item retrieval with transport decoding |
//! | [`crawler`] | Budgeted important-file crawl |
//! | [`activity`] | Recent commits and pull requests |
//! | [`context`] | Chat and analysis prompt assembly |
//! | [`model`] | Language-model adapter |
//! | [`assistant`] | Chat and analysis request flows |
//!
//! Data types, file classification, and the session/analysis stores live
//! in the `repo-context-core` crate.

pub mod activity;
pub mod assistant;
pub mod config;
pub mod context;
pub mod crawler;
pub mod fetcher;
pub mod github;
pub mod host;
pub mod model;

#[cfg(test)]
mod test_support;

pub use repo_context_core::{classify, kpi, models, outcome, store};
