//! Protection rules for entities owned by another provisioning system.
//!
//! Users and groups pushed into the target store by a separate upstream (for
//! example an identity federation) are invisible to the source directory, so
//! they always show up as delete candidates. These rules keep them alive.

use std::fmt;

use crate::entity::SyncEntity;
use crate::model::{Group, Membership, User};

/// Why a delete candidate was preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The user carries an email of an externally managed type.
    ExternalEmailType(String),
    /// The user name ends with a protected suffix.
    ProtectedUserSuffix(String),
    /// The group name starts with a protected prefix.
    ProtectedGroupPrefix(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalEmailType(t) => write!(f, "email type '{t}' is externally managed"),
            Self::ProtectedUserSuffix(s) => write!(f, "name ends with protected suffix '{s}'"),
            Self::ProtectedGroupPrefix(p) => write!(f, "name starts with protected prefix '{p}'"),
        }
    }
}

/// Configurable deletion guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipPolicy {
    /// Group names starting with any of these are never deleted.
    pub protected_group_prefixes: Vec<String>,
    /// User names ending with any of these are never deleted.
    pub protected_user_suffixes: Vec<String>,
    /// Users with an email of one of these types are never deleted.
    pub external_email_types: Vec<String>,
}

impl SkipPolicy {
    /// A policy that protects nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_group_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.protected_group_prefixes.push(prefix.into().to_lowercase());
        self
    }

    #[must_use]
    pub fn with_user_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.protected_user_suffixes.push(suffix.into().to_lowercase());
        self
    }

    #[must_use]
    pub fn with_external_email_type(mut self, kind: impl Into<String>) -> Self {
        self.external_email_types.push(kind.into());
        self
    }

    /// Checks the group rules.
    #[must_use]
    pub fn group_skip_reason(&self, group: &Group) -> Option<SkipReason> {
        let name = group.name.to_lowercase();
        self.protected_group_prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find(|p| name.starts_with(p.to_lowercase().as_str()))
            .map(|p| SkipReason::ProtectedGroupPrefix(p.clone()))
    }

    /// Checks the user rules. The email-type rule is checked first.
    #[must_use]
    pub fn user_skip_reason(&self, user: &User) -> Option<SkipReason> {
        let external = user.emails.iter().find_map(|email| {
            let kind = email.kind.as_deref()?;
            self.external_email_types
                .iter()
                .find(|t| t.eq_ignore_ascii_case(kind))
                .map(|t| SkipReason::ExternalEmailType(t.clone()))
        });
        if external.is_some() {
            return external;
        }

        let name = user.name.to_lowercase();
        self.protected_user_suffixes
            .iter()
            .filter(|s| !s.is_empty())
            .find(|s| name.ends_with(s.to_lowercase().as_str()))
            .map(|s| SkipReason::ProtectedUserSuffix(s.clone()))
    }

    /// Memberships follow the plain reconcile result.
    #[must_use]
    pub fn membership_skip_reason(&self, _membership: &Membership) -> Option<SkipReason> {
        None
    }

    /// Whether a delete candidate of any entity type must be preserved.
    #[must_use]
    pub fn should_skip_delete<E: SyncEntity>(&self, entry: &E) -> bool {
        entry.skip_reason(self).is_some()
    }
}
