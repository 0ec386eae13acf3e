//! Per-fetch outcomes.
//!
//! Every sub-fetch that feeds a prompt section resolves to a [`Fetched`]
//! value instead of an error: either the data, or the reason the section
//! has to be left out. Callers keep assembling with whatever succeeded.

use std::fmt;

/// Why a section or item was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OmitReason {
    /// The request has no repository to pull data from.
    NotLinked,
    /// The upstream call succeeded but returned nothing usable.
    Empty,
    /// The upstream call failed.
    Failed(String),
}

impl fmt::Display for OmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmitReason::NotLinked => f.write_str("no repository linked"),
            OmitReason::Empty => f.write_str("no data"),
            OmitReason::Failed(msg) => write!(f, "fetch failed: {}", msg),
        }
    }
}

/// Result of a best-effort fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Ready(T),
    Omitted(OmitReason),
}

impl<T> Fetched<T> {
    /// Wrap a fallible result, turning the error into [`OmitReason::Failed`].
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Fetched::Ready(v),
            Err(e) => Fetched::Omitted(OmitReason::Failed(e.to_string())),
        }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Fetched::Omitted(OmitReason::Failed(msg.into()))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Fetched::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Fetched::Ready(v) => Some(v),
            Fetched::Omitted(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Ready(v) => Fetched::Ready(f(v)),
            Fetched::Omitted(r) => Fetched::Omitted(r),
        }
    }

    pub fn reason(&self) -> Option<&OmitReason> {
        match self {
            Fetched::Ready(_) => None,
            Fetched::Omitted(r) => Some(r),
        }
    }
}

impl<T> Fetched<Vec<T>> {
    /// Treat an empty collection as omitted.
    pub fn non_empty(self) -> Self {
        match self {
            Fetched::Ready(v) if v.is_empty() => Fetched::Omitted(OmitReason::Empty),
            other => other,
        }
    }

    /// The collection, or an empty one when omitted.
    pub fn unwrap_or_empty(self) -> Vec<T> {
        self.ready().unwrap_or_default()
    }
}
