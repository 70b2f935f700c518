//! Error types for the GitHub connector.

use std::time::Duration;

use thiserror::Error;
use xavyo_directory_sync::SyncError;

/// Result type alias using `GitHubError`.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Errors that can occur when reading the GitHub organisation.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// App JWT or installation token error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success HTTP status.
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Errors reported in a GraphQL response body.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Primary or secondary rate limit hit.
    #[error("Rate limited by GitHub")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT signing error.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl From<GitHubError> for SyncError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::RateLimited { retry_after } => SyncError::Throttled { retry_after },
            other => SyncError::Source(other.to_string()),
        }
    }
}
