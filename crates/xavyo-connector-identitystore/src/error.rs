//! Error types for the Identity Store connector.

use std::fmt::Debug;
use std::time::Duration;

use aws_sdk_identitystore::error::{DisplayErrorContext, SdkError};
use aws_sdk_identitystore::operation::{
    create_group::CreateGroupError, create_group_membership::CreateGroupMembershipError,
    create_user::CreateUserError, delete_group::DeleteGroupError,
    delete_group_membership::DeleteGroupMembershipError, delete_user::DeleteUserError,
    list_group_memberships::ListGroupMembershipsError, list_groups::ListGroupsError,
    list_users::ListUsersError,
};
use thiserror::Error;
use xavyo_directory_sync::SyncError;

/// Result type alias using `IdentityStoreError`.
pub type IdentityStoreResult<T> = Result<T, IdentityStoreError>;

/// Errors returned by the Identity Store API.
#[derive(Debug, Error)]
pub enum IdentityStoreError {
    /// The API rejected the call with a `ThrottlingException`.
    #[error("Throttled by Identity Store during {operation}")]
    Throttled {
        operation: &'static str,
        retry_after: Option<Duration>,
    },

    /// Any other SDK failure.
    #[error("Identity Store {operation} failed: {message}")]
    Sdk {
        operation: &'static str,
        message: String,
    },

    /// A listed record lacked a field the sync relies on.
    #[error("Identity Store returned an incomplete {0} record")]
    IncompleteRecord(&'static str),
}

impl From<IdentityStoreError> for SyncError {
    fn from(err: IdentityStoreError) -> Self {
        match err {
            IdentityStoreError::Throttled { retry_after, .. } => SyncError::Throttled { retry_after },
            other => SyncError::Target(other.to_string()),
        }
    }
}

/// Operation errors that can carry a `ThrottlingException`.
pub(crate) trait ThrottleHint {
    /// `Some` when throttled, holding the advertised wait in seconds.
    fn throttle_hint(&self) -> Option<Option<i32>>;
}

macro_rules! impl_throttle_hint {
    ($($error:ty),+ $(,)?) => {$(
        impl ThrottleHint for $error {
            fn throttle_hint(&self) -> Option<Option<i32>> {
                match self {
                    Self::ThrottlingException(e) => Some(Some(e.retry_after_seconds())),
                    _ => None,
                }
            }
        }
    )+};
}

impl_throttle_hint!(
    ListGroupsError,
    ListUsersError,
    ListGroupMembershipsError,
    CreateGroupError,
    DeleteGroupError,
    CreateUserError,
    DeleteUserError,
    CreateGroupMembershipError,
    DeleteGroupMembershipError,
);

/// Classifies an SDK failure of `operation`.
pub(crate) fn sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> IdentityStoreError
where
    E: ThrottleHint + std::error::Error + 'static,
    R: Debug,
{
    if let Some(seconds) = err.as_service_error().and_then(ThrottleHint::throttle_hint) {
        return IdentityStoreError::Throttled {
            operation,
            retry_after: retry_after(seconds),
        };
    }
    IdentityStoreError::Sdk {
        operation,
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn retry_after(seconds: Option<i32>) -> Option<Duration> {
    seconds
        .and_then(|s| u64::try_from(s).ok())
        .map(Duration::from_secs)
}
