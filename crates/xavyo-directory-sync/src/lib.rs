//! Directory sync engine for xavyo.
//!
//! Keeps an identity store's groups, users and group memberships aligned with
//! an authoritative organisation directory. Each run builds complete snapshots
//! from both sides, computes the minimal create/delete sets by name and
//! applies them in a fixed order: groups, users, then memberships.
//!
//! # Features
//!
//! - Name-keyed, case-insensitive reconciliation
//! - Paginated snapshots with a single retry on throttling
//! - Skip rules protecting entities owned by another provisioning system
//! - Dry-run mode that logs every planned mutation without sending it
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use xavyo_directory_sync::{SourceDirectory, SyncConfig, SyncEngine, TargetStore};
//!
//! # async fn example(
//! #     source: Arc<dyn SourceDirectory>,
//! #     target: Arc<dyn TargetStore>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::from_env()?;
//! let summary = SyncEngine::new(source, target, config).run().await?;
//! println!("{} failed mutations", summary.failed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod membership;
pub mod model;
pub mod payload;
pub mod reconcile;
pub mod skip;
pub mod traits;

// Re-exports
pub use config::{ConfigError, SyncConfig, UserSource};
pub use engine::{RunSummary, SyncEngine};
pub use entity::{PayloadContext, SyncEntity};
pub use error::{SyncError, SyncResult};
pub use executor::{Action, PlannedAction, SkippedDelete, SyncExecutor, SyncStats};
pub use fetch::PagedFetcher;
pub use membership::reconcile_memberships;
pub use model::{
    EntityKind, Group, GroupRef, Membership, MembershipRecord, Named, Page, SourceMember,
    SourceTeam, User, UserEmail,
};
pub use reconcile::{reconcile, ReconcileResult};
pub use skip::{SkipPolicy, SkipReason};
pub use traits::{SourceDirectory, TargetStore};
