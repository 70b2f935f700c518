//! AWS IAM Identity Store target for xavyo directory sync
//!
//! Implements [`TargetStore`](xavyo_directory_sync::TargetStore) on top of
//! `aws-sdk-identitystore`. User names carry the configured email suffix in
//! the store and are mapped back to bare, lowercased source names when listed.
//! `ThrottlingException` responses surface as throttling so the sync engine
//! can retry the page.

mod client;
mod config;
mod error;

// Re-exports
pub use client::{target_user_name, IdentityStoreClient};
pub use config::{IdentityStoreConfig, DEFAULT_PAGE_SIZE};
pub use error::{IdentityStoreError, IdentityStoreResult};
