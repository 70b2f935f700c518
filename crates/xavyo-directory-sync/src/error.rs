//! Error types for the directory sync engine.

use std::time::Duration;

use thiserror::Error;

use crate::model::EntityKind;

/// Result type alias using `SyncError`.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while fetching snapshots or applying changes.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The provider asked us to slow down.
    #[error("Throttled by provider{}", format_retry_after(.retry_after))]
    Throttled { retry_after: Option<Duration> },

    /// A snapshot could not be fetched. Fatal for the current run.
    #[error("Fetch failed for {operation}: {message}")]
    Fetch { operation: String, message: String },

    /// Source directory error.
    #[error("Source directory error: {0}")]
    Source(String),

    /// Target store error.
    #[error("Target store error: {0}")]
    Target(String),

    /// A single create or delete call failed.
    #[error("Failed to {action} {kind} '{name}': {message}")]
    Mutation {
        action: &'static str,
        kind: EntityKind,
        name: String,
        message: String,
    },

    /// A delete candidate carried no provider identifier.
    #[error("Missing identifier for {kind} '{name}'")]
    MissingIdentifier { kind: EntityKind, name: String },
}

impl SyncError {
    /// Whether this error is a throttling signal.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }

    /// Backoff requested by the provider, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after } => *retry_after,
            _ => None,
        }
    }
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {} seconds", d.as_secs()),
        None => String::new(),
    }
}
