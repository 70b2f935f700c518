//! Provider payloads, one pure builder per entity type and action.

use serde::Serialize;

use crate::error::{SyncError, SyncResult};
use crate::model::{EntityKind, Group, Membership, User};

/// Request to create a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateGroupRequest {
    pub display_name: String,
}

impl CreateGroupRequest {
    #[must_use]
    pub fn for_group(group: &Group) -> Self {
        Self {
            display_name: group.name.clone(),
        }
    }
}

/// Structured name of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserName {
    pub family_name: String,
    pub given_name: String,
}

/// Email attached to a created user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailRequest {
    pub primary: bool,
    #[serde(rename = "Type")]
    pub kind: String,
    pub value: String,
}

/// Request to create a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateUserRequest {
    pub user_name: String,
    pub display_name: String,
    pub name: UserName,
    pub emails: Vec<EmailRequest>,
}

impl CreateUserRequest {
    /// Qualifies the source name with `email_suffix` and uses it for every
    /// name field and a single primary work email.
    #[must_use]
    pub fn for_user(user: &User, email_suffix: &str) -> Self {
        let qualified = format!("{}{}", user.name, email_suffix);
        Self {
            user_name: qualified.clone(),
            display_name: qualified.clone(),
            name: UserName {
                family_name: qualified.clone(),
                given_name: qualified.clone(),
            },
            emails: vec![EmailRequest {
                primary: true,
                kind: "work".to_string(),
                value: qualified,
            }],
        }
    }
}

/// Request to add a user to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMembershipRequest {
    pub group_id: String,
    pub member_id: MemberId,
}

/// Member reference of a membership request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberId {
    pub user_id: String,
}

impl CreateMembershipRequest {
    #[must_use]
    pub fn for_membership(membership: &Membership) -> Self {
        Self {
            group_id: membership.group.id.clone(),
            member_id: MemberId {
                user_id: membership.user_id.clone(),
            },
        }
    }
}

/// Request to delete a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteGroupRequest {
    pub group_id: String,
}

impl DeleteGroupRequest {
    /// Fails when the group carries no identifier.
    pub fn for_group(group: &Group) -> SyncResult<Self> {
        let group_id = group.id.clone().ok_or_else(|| SyncError::MissingIdentifier {
            kind: EntityKind::Groups,
            name: group.name.clone(),
        })?;
        Ok(Self { group_id })
    }
}

/// Request to delete a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
}

impl DeleteUserRequest {
    /// Fails when the user carries no identifier.
    pub fn for_user(user: &User) -> SyncResult<Self> {
        let user_id = user.id.clone().ok_or_else(|| SyncError::MissingIdentifier {
            kind: EntityKind::Users,
            name: user.name.clone(),
        })?;
        Ok(Self { user_id })
    }
}

/// Request to remove a user from a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMembershipRequest {
    pub membership_id: String,
}

impl DeleteMembershipRequest {
    /// Fails when the membership has not been assigned an identifier.
    pub fn for_membership(membership: &Membership) -> SyncResult<Self> {
        let membership_id =
            membership
                .membership_id
                .clone()
                .ok_or_else(|| SyncError::MissingIdentifier {
                    kind: EntityKind::Memberships,
                    name: membership.name.clone(),
                })?;
        Ok(Self { membership_id })
    }
}

/// A create call, one variant per entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CreateRequest {
    Group(CreateGroupRequest),
    User(CreateUserRequest),
    Membership(CreateMembershipRequest),
}

/// A delete call, one variant per entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeleteRequest {
    Group(DeleteGroupRequest),
    User(DeleteUserRequest),
    Membership(DeleteMembershipRequest),
}
