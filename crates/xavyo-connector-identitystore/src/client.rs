//! AWS IAM Identity Store implementation of the sync target.

use async_trait::async_trait;
use aws_sdk_identitystore::types::{Email, MemberId, Name};
use tracing::{info, instrument, warn};

use xavyo_directory_sync::payload::{
    CreateGroupRequest, CreateMembershipRequest, CreateUserRequest, DeleteGroupRequest,
    DeleteMembershipRequest, DeleteUserRequest,
};
use xavyo_directory_sync::{Group, MembershipRecord, Page, SyncResult, TargetStore, User, UserEmail};

use crate::error::{sdk_error, IdentityStoreError};
use crate::IdentityStoreConfig;

/// Identity Store client scoped to one store.
#[derive(Debug)]
pub struct IdentityStoreClient {
    client: aws_sdk_identitystore::Client,
    identity_store_id: String,
    email_suffix: String,
    page_size: i32,
}

impl IdentityStoreClient {
    /// Builds an SDK client for the configured region from the default
    /// credential chain.
    pub async fn new(config: IdentityStoreConfig) -> Self {
        let sdk_config = aws_config::from_env()
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        let client = aws_sdk_identitystore::Client::new(&sdk_config);

        info!(
            region = %config.region,
            identity_store_id = %config.identity_store_id,
            "Identity Store client initialized"
        );

        Self::with_client(client, config)
    }

    /// Wraps an existing SDK client.
    pub fn with_client(
        client: aws_sdk_identitystore::Client,
        config: IdentityStoreConfig,
    ) -> Self {
        Self {
            client,
            identity_store_id: config.identity_store_id,
            email_suffix: config.email_suffix,
            page_size: config.page_size,
        }
    }
}

#[async_trait]
impl TargetStore for IdentityStoreClient {
    #[instrument(skip(self))]
    async fn list_groups(&self, next_token: Option<String>) -> SyncResult<Page<Group>> {
        let output = self
            .client
            .list_groups()
            .identity_store_id(&self.identity_store_id)
            .max_results(self.page_size)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("ListGroups", e))?;

        let groups = output
            .groups()
            .iter()
            .filter_map(|g| match g.display_name() {
                Some(name) => Some(Group::with_id(g.group_id(), name)),
                None => {
                    warn!(group_id = %g.group_id(), "Ignoring group without display name");
                    None
                }
            })
            .collect();

        Ok(to_page(groups, output.next_token()))
    }

    #[instrument(skip(self))]
    async fn list_users(&self, next_token: Option<String>) -> SyncResult<Page<User>> {
        let output = self
            .client
            .list_users()
            .identity_store_id(&self.identity_store_id)
            .max_results(self.page_size)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("ListUsers", e))?;

        let users = output
            .users()
            .iter()
            .filter_map(|u| {
                let Some(user_name) = u.user_name() else {
                    warn!(user_id = %u.user_id(), "Ignoring user without user name");
                    return None;
                };
                let emails = u.emails().iter().filter_map(user_email).collect();
                Some(
                    User::with_id(u.user_id(), target_user_name(user_name, &self.email_suffix))
                        .with_emails(emails),
                )
            })
            .collect();

        Ok(to_page(users, output.next_token()))
    }

    #[instrument(skip(self))]
    async fn list_group_memberships(
        &self,
        group_id: &str,
        next_token: Option<String>,
    ) -> SyncResult<Page<MembershipRecord>> {
        let output = self
            .client
            .list_group_memberships()
            .identity_store_id(&self.identity_store_id)
            .group_id(group_id)
            .max_results(self.page_size)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("ListGroupMemberships", e))?;

        let mut records = Vec::with_capacity(output.group_memberships().len());
        for membership in output.group_memberships() {
            let user_id = membership
                .member_id()
                .and_then(|m| m.as_user_id().ok())
                .cloned();
            match (membership.membership_id(), user_id) {
                (Some(membership_id), Some(user_id)) => records.push(MembershipRecord {
                    membership_id: membership_id.to_string(),
                    user_id,
                }),
                _ => warn!(
                    group_id,
                    error = %IdentityStoreError::IncompleteRecord("group membership"),
                    "Ignoring membership"
                ),
            }
        }

        Ok(to_page(records, output.next_token()))
    }

    async fn create_group(&self, request: &CreateGroupRequest) -> SyncResult<()> {
        self.client
            .create_group()
            .identity_store_id(&self.identity_store_id)
            .display_name(&request.display_name)
            .send()
            .await
            .map_err(|e| sdk_error("CreateGroup", e))?;
        Ok(())
    }

    async fn delete_group(&self, request: &DeleteGroupRequest) -> SyncResult<()> {
        self.client
            .delete_group()
            .identity_store_id(&self.identity_store_id)
            .group_id(&request.group_id)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteGroup", e))?;
        Ok(())
    }

    async fn create_user(&self, request: &CreateUserRequest) -> SyncResult<()> {
        let name = Name::builder()
            .family_name(&request.name.family_name)
            .given_name(&request.name.given_name)
            .build();

        let mut call = self
            .client
            .create_user()
            .identity_store_id(&self.identity_store_id)
            .user_name(&request.user_name)
            .display_name(&request.display_name)
            .name(name);
        for email in &request.emails {
            call = call.emails(
                Email::builder()
                    .value(&email.value)
                    .r#type(&email.kind)
                    .primary(email.primary)
                    .build(),
            );
        }

        call.send().await.map_err(|e| sdk_error("CreateUser", e))?;
        Ok(())
    }

    async fn delete_user(&self, request: &DeleteUserRequest) -> SyncResult<()> {
        self.client
            .delete_user()
            .identity_store_id(&self.identity_store_id)
            .user_id(&request.user_id)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteUser", e))?;
        Ok(())
    }

    async fn create_membership(&self, request: &CreateMembershipRequest) -> SyncResult<()> {
        self.client
            .create_group_membership()
            .identity_store_id(&self.identity_store_id)
            .group_id(&request.group_id)
            .member_id(MemberId::UserId(request.member_id.user_id.clone()))
            .send()
            .await
            .map_err(|e| sdk_error("CreateGroupMembership", e))?;
        Ok(())
    }

    async fn delete_membership(&self, request: &DeleteMembershipRequest) -> SyncResult<()> {
        self.client
            .delete_group_membership()
            .identity_store_id(&self.identity_store_id)
            .membership_id(&request.membership_id)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteGroupMembership", e))?;
        Ok(())
    }
}

fn to_page<T>(items: Vec<T>, next_token: Option<&str>) -> Page<T> {
    match next_token.filter(|t| !t.is_empty()) {
        Some(token) => Page::with_next(items, token),
        None => Page::last(items),
    }
}

fn user_email(email: &Email) -> Option<UserEmail> {
    Some(UserEmail {
        value: email.value()?.to_string(),
        kind: email.r#type().map(str::to_string),
        primary: email.primary(),
    })
}

/// Maps a stored user name back to the source name.
///
/// The suffix is matched case-insensitively and only at the end.
pub fn target_user_name(user_name: &str, email_suffix: &str) -> String {
    let split = user_name.len().saturating_sub(email_suffix.len());
    let stripped = match (user_name.get(..split), user_name.get(split..)) {
        (Some(head), Some(tail))
            if !email_suffix.is_empty() && tail.eq_ignore_ascii_case(email_suffix) =>
        {
            head
        }
        _ => user_name,
    };
    stripped.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_user_name_strips_suffix() {
        assert_eq!(target_user_name("alice@example.com", "@example.com"), "alice");
        assert_eq!(target_user_name("Alice@EXAMPLE.com", "@example.com"), "alice");
        assert_eq!(target_user_name("bob@example.com ", "@example.com"), "bob@example.com ");
    }

    #[test]
    fn test_target_user_name_without_suffix() {
        assert_eq!(target_user_name("carol@other.org", "@example.com"), "carol@other.org");
        assert_eq!(target_user_name("Dave", ""), "dave");
        // Only a trailing suffix is stripped.
        assert_eq!(
            target_user_name("@example.com.evil", "@example.com"),
            "@example.com.evil"
        );
    }

    #[test]
    fn test_to_page() {
        assert_eq!(to_page(vec![1], Some("t")).next_token.as_deref(), Some("t"));
        assert!(to_page(vec![1], Some("")).next_token.is_none());
        assert!(to_page::<i32>(vec![], None).next_token.is_none());
    }

    #[test]
    fn test_user_email() {
        let email = Email::builder()
            .value("alice@example.com")
            .r#type("EntraId")
            .primary(true)
            .build();
        assert_eq!(
            user_email(&email),
            Some(UserEmail {
                value: "alice@example.com".into(),
                kind: Some("EntraId".into()),
                primary: true,
            })
        );
        assert_eq!(user_email(&Email::builder().build()), None);
    }
}
