//! Snapshot entities shared by the reconciler, the executor and the providers.

use std::fmt;

use serde::Serialize;

/// Lowercases a name so it can be used as a reconciliation key.
///
/// Whitespace is kept: `" a"` and `"a"` are different entries.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// An entity that is reconciled by its name.
pub trait Named {
    /// The reconciliation key. Expected to be normalized already.
    fn name(&self) -> &str;
}

/// The three entity types handled by the pipeline, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Groups,
    Users,
    Memberships,
}

impl EntityKind {
    /// Tag used in log lines.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::Users => "users",
            Self::Memberships => "membership",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group, either from the target store (with `id`) or derived from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Target-store identifier. Absent for source-side entries.
    pub id: Option<String>,
    /// Normalized group name.
    pub name: String,
}

impl Group {
    /// Source-side group with no identifier.
    pub fn named(name: impl AsRef<str>) -> Self {
        Self {
            id: None,
            name: normalize_name(name.as_ref()),
        }
    }

    /// Target-side group.
    pub fn with_id(id: impl Into<String>, name: impl AsRef<str>) -> Self {
        Self {
            id: Some(id.into()),
            name: normalize_name(name.as_ref()),
        }
    }
}

impl Named for Group {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An email address attached to a target-store user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEmail {
    pub value: String,
    /// Provider-defined type, e.g. `work`.
    pub kind: Option<String>,
    pub primary: bool,
}

/// A user, either from the target store (with `id`) or derived from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Target-store identifier. Absent for source-side entries.
    pub id: Option<String>,
    /// Normalized user name without the target email suffix.
    pub name: String,
    /// Only consulted by the skip policy.
    #[serde(default)]
    pub emails: Vec<UserEmail>,
}

impl User {
    /// Source-side user with no identifier.
    pub fn named(name: impl AsRef<str>) -> Self {
        Self {
            id: None,
            name: normalize_name(name.as_ref()),
            emails: Vec::new(),
        }
    }

    /// Target-side user.
    pub fn with_id(id: impl Into<String>, name: impl AsRef<str>) -> Self {
        Self {
            id: Some(id.into()),
            name: normalize_name(name.as_ref()),
            emails: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_emails(mut self, emails: Vec<UserEmail>) -> Self {
        self.emails = emails;
        self
    }
}

impl Named for User {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The target group a membership belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// A user's membership of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    /// Assigned by the target store. Absent for memberships still to be created.
    pub membership_id: Option<String>,
    pub user_id: String,
    /// Normalized member name, the reconciliation key.
    pub name: String,
    pub group: GroupRef,
}

impl Named for Membership {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Raw membership record as listed by the target store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipRecord {
    pub membership_id: String,
    pub user_id: String,
}

/// A member of a source team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceMember {
    pub name: String,
}

impl SourceMember {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
        }
    }
}

impl Named for SourceMember {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A team in the source directory with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTeam {
    pub name: String,
    pub members: Vec<SourceMember>,
}

impl SourceTeam {
    pub fn new<I, S>(name: impl AsRef<str>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: normalize_name(name.as_ref()),
            members: members.into_iter().map(SourceMember::new).collect(),
        }
    }
}

impl Named for SourceTeam {
    fn name(&self) -> &str {
        &self.name
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}
