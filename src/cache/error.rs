use thiserror::Error;

use super::resolver::ContentId;

/// Failure reported by a `CacheStore` implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend timed out after {millis}ms")]
    Timeout { millis: u64 },
    #[error("backend rejected operation: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Content lookup failed or content is absent.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error("content {0} not found")]
    NotFound(ContentId),
    #[error("content lookup failed: {0}")]
    Lookup(String),
}

impl ResolutionError {
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup(message.into())
    }
}

/// A single failed backend call recorded during a drain.
#[derive(Debug, Clone, Error)]
#[error("{operation} on group `{group}` failed: {source}")]
pub struct BackendError {
    pub operation: BackendOperation,
    pub group: String,
    pub key: Option<String>,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOperation {
    Delete,
    Flush,
}

impl std::fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendOperation::Delete => f.write_str("delete"),
            BackendOperation::Flush => f.write_str("flush"),
        }
    }
}

/// Failure surfaced to the caller of an enqueue.
///
/// Resolution failures queue nothing and backend failures land in the
/// `DrainReport`, so neither appears here.
#[derive(Debug, Clone, Error)]
pub enum FlushError {
    #[error("{collaborator} is not ready: {reason}")]
    Precondition {
        collaborator: &'static str,
        reason: String,
    },
}

impl FlushError {
    pub fn precondition(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self::Precondition {
            collaborator,
            reason: reason.into(),
        }
    }
}
