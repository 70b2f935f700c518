//! GitHub organisation source for xavyo directory sync
//!
//! Reads an organisation's teams, their members and the flat organisation
//! member list through the GitHub GraphQL API, implementing
//! [`SourceDirectory`](xavyo_directory_sync::SourceDirectory).
//!
//! # Features
//!
//! - Static token or GitHub App authentication with installation token caching
//! - Cursor pagination for teams, team members and organisation members
//! - Primary and secondary rate limits surfaced as throttling
//!
//! # Example
//!
//! ```no_run
//! use xavyo_connector_github::{GitHubClient, GitHubConfig};
//! use xavyo_directory_sync::SourceDirectory;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new(GitHubConfig::from_env()?)?;
//! let teams = client.fetch_teams(&["all-org-members".to_string()]).await?;
//! println!("{} teams", teams.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod error;

// Re-exports
pub use auth::TokenCache;
pub use client::GitHubClient;
pub use config::{GitHubConfig, GitHubCredentials, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
pub use error::{GitHubError, GitHubResult};
