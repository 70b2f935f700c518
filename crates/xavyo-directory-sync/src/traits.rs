//! Collaborator traits for the source directory and the target store.
//!
//! Implementations report throttling as [`SyncError::Throttled`] so that the
//! paged fetcher can apply its retry policy.
//!
//! [`SyncError::Throttled`]: crate::error::SyncError::Throttled

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::model::{Group, MembershipRecord, Page, SourceMember, SourceTeam, User};
use crate::payload::{
    CreateGroupRequest, CreateMembershipRequest, CreateUserRequest, DeleteGroupRequest,
    DeleteMembershipRequest, DeleteUserRequest,
};

/// The authoritative organisation directory.
#[async_trait]
pub trait SourceDirectory: Send + Sync {
    /// All teams with their members, excluding teams named in `ignore_list`.
    async fn fetch_teams(&self, ignore_list: &[String]) -> SyncResult<Vec<SourceTeam>>;

    /// Flat organisation membership, without team grouping.
    async fn fetch_org_members(&self) -> SyncResult<Vec<SourceMember>>;
}

/// The identity store being kept in sync.
///
/// Listing methods return one page at a time; `next_token` is the token of
/// the previous page, `None` for the first one.
#[async_trait]
pub trait TargetStore: Send + Sync {
    async fn list_groups(&self, next_token: Option<String>) -> SyncResult<Page<Group>>;

    async fn list_users(&self, next_token: Option<String>) -> SyncResult<Page<User>>;

    async fn list_group_memberships(
        &self,
        group_id: &str,
        next_token: Option<String>,
    ) -> SyncResult<Page<MembershipRecord>>;

    async fn create_group(&self, request: &CreateGroupRequest) -> SyncResult<()>;

    async fn delete_group(&self, request: &DeleteGroupRequest) -> SyncResult<()>;

    async fn create_user(&self, request: &CreateUserRequest) -> SyncResult<()>;

    async fn delete_user(&self, request: &DeleteUserRequest) -> SyncResult<()>;

    async fn create_membership(&self, request: &CreateMembershipRequest) -> SyncResult<()>;

    async fn delete_membership(&self, request: &DeleteMembershipRequest) -> SyncResult<()>;
}
