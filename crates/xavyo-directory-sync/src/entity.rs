//! Per-entity behavior used by the executor.

use crate::error::SyncResult;
use crate::model::{EntityKind, Group, Membership, Named, User};
use crate::payload::{
    CreateGroupRequest, CreateMembershipRequest, CreateRequest, CreateUserRequest,
    DeleteGroupRequest, DeleteMembershipRequest, DeleteRequest, DeleteUserRequest,
};
use crate::skip::{SkipPolicy, SkipReason};

/// Values the payload builders need besides the entity itself.
#[derive(Debug, Clone, Default)]
pub struct PayloadContext {
    /// Appended to source user names to build target user names.
    pub email_suffix: String,
}

/// An entity type the executor knows how to create, delete and protect.
pub trait SyncEntity: Named + Clone + Send + Sync {
    const KIND: EntityKind;

    fn create_request(&self, ctx: &PayloadContext) -> CreateRequest;

    fn delete_request(&self) -> SyncResult<DeleteRequest>;

    fn skip_reason(&self, policy: &SkipPolicy) -> Option<SkipReason>;

    /// Identifying name shown in log lines.
    fn label(&self) -> String {
        self.name().to_string()
    }
}

impl SyncEntity for Group {
    const KIND: EntityKind = EntityKind::Groups;

    fn create_request(&self, _ctx: &PayloadContext) -> CreateRequest {
        CreateRequest::Group(CreateGroupRequest::for_group(self))
    }

    fn delete_request(&self) -> SyncResult<DeleteRequest> {
        DeleteGroupRequest::for_group(self).map(DeleteRequest::Group)
    }

    fn skip_reason(&self, policy: &SkipPolicy) -> Option<SkipReason> {
        policy.group_skip_reason(self)
    }
}

impl SyncEntity for User {
    const KIND: EntityKind = EntityKind::Users;

    fn create_request(&self, ctx: &PayloadContext) -> CreateRequest {
        CreateRequest::User(CreateUserRequest::for_user(self, &ctx.email_suffix))
    }

    fn delete_request(&self) -> SyncResult<DeleteRequest> {
        DeleteUserRequest::for_user(self).map(DeleteRequest::User)
    }

    fn skip_reason(&self, policy: &SkipPolicy) -> Option<SkipReason> {
        policy.user_skip_reason(self)
    }
}

impl SyncEntity for Membership {
    const KIND: EntityKind = EntityKind::Memberships;

    fn create_request(&self, _ctx: &PayloadContext) -> CreateRequest {
        CreateRequest::Membership(CreateMembershipRequest::for_membership(self))
    }

    fn delete_request(&self) -> SyncResult<DeleteRequest> {
        DeleteMembershipRequest::for_membership(self).map(DeleteRequest::Membership)
    }

    fn skip_reason(&self, policy: &SkipPolicy) -> Option<SkipReason> {
        policy.membership_skip_reason(self)
    }

    fn label(&self) -> String {
        format!("{} <=> {}", self.name, self.group.name)
    }
}
