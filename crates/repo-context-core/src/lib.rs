//! # repo-context core
//!
//! Runtime-independent building blocks for repo-context: the data model,
//! important-file classification, per-fetch outcomes, activity KPIs, and the
//! session / analysis store abstraction with its in-memory backend.
//!
//! This crate has no tokio, HTTP, or filesystem dependencies.

pub mod classify;
pub mod kpi;
pub mod models;
pub mod outcome;
pub mod store;
