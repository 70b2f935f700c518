//! Applies reconcile results to the target store.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::entity::{PayloadContext, SyncEntity};
use crate::error::{SyncError, SyncResult};
use crate::model::EntityKind;
use crate::payload::{CreateRequest, DeleteRequest};
use crate::reconcile::ReconcileResult;
use crate::skip::{SkipPolicy, SkipReason};
use crate::traits::TargetStore;

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation as it was logged, whether or not it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub dry_run: bool,
    pub action: Action,
    pub kind: EntityKind,
    pub label: String,
    /// JSON rendering of the exact payload.
    pub payload: String,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            f.write_str("DRYRUN: ")?;
        }
        write!(
            f,
            "[{}] [{}] [{}] {}",
            self.action, self.kind, self.label, self.payload
        )
    }
}

/// A delete candidate preserved by the skip policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDelete {
    pub kind: EntityKind,
    pub label: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipping deletion of {} '{}': {}",
            self.kind, self.label, self.reason
        )
    }
}

/// Outcome of syncing one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub kind: EntityKind,
    /// Calls that went through. Always zero in dry-run.
    pub created: usize,
    pub deleted: usize,
    pub failed: usize,
    pub planned: Vec<PlannedAction>,
    pub skipped: Vec<SkippedDelete>,
}

impl SyncStats {
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            created: 0,
            deleted: 0,
            failed: 0,
            planned: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Adds another batch of the same entity type.
    pub fn merge(&mut self, other: SyncStats) {
        self.created += other.created;
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.planned.extend(other.planned);
        self.skipped.extend(other.skipped);
    }

    #[must_use]
    pub fn planned_count(&self, action: Action) -> usize {
        self.planned.iter().filter(|p| p.action == action).count()
    }
}

/// Builds payloads, logs every planned mutation and, outside dry-run, issues
/// the calls one at a time.
pub struct SyncExecutor {
    target: Arc<dyn TargetStore>,
    dry_run: bool,
    policy: SkipPolicy,
    payload_ctx: PayloadContext,
}

impl SyncExecutor {
    pub fn new(
        target: Arc<dyn TargetStore>,
        dry_run: bool,
        policy: SkipPolicy,
        payload_ctx: PayloadContext,
    ) -> Self {
        Self {
            target,
            dry_run,
            policy,
            payload_ctx,
        }
    }

    /// Applies `result`: every create first, then every delete.
    ///
    /// A failing item is logged and counted; the remaining items are still
    /// processed.
    pub async fn sync<E: SyncEntity>(&self, result: &ReconcileResult<E>) -> SyncStats {
        let mut stats = SyncStats::new(E::KIND);

        for entry in &result.create {
            let request = entry.create_request(&self.payload_ctx);
            let planned = self.plan(Action::Create, E::KIND, entry.label(), &request);

            if !self.dry_run {
                match self.send_create(&request).await {
                    Ok(()) => stats.created += 1,
                    Err(e) => self.record_failure(&mut stats, &planned, e),
                }
            }
            stats.planned.push(planned);
        }

        for entry in &result.delete {
            if let Some(reason) = entry.skip_reason(&self.policy) {
                let skipped = SkippedDelete {
                    kind: E::KIND,
                    label: entry.label(),
                    reason,
                };
                info!(entity = %E::KIND, name = %skipped.label, "{skipped}");
                stats.skipped.push(skipped);
                continue;
            }

            let request = match entry.delete_request() {
                Ok(request) => request,
                Err(e) => {
                    error!(entity = %E::KIND, name = %entry.label(), error = %e, "[error] {e}");
                    stats.failed += 1;
                    continue;
                }
            };
            let planned = self.plan(Action::Delete, E::KIND, entry.label(), &request);

            if !self.dry_run {
                match self.send_delete(&request).await {
                    Ok(()) => stats.deleted += 1,
                    Err(e) => self.record_failure(&mut stats, &planned, e),
                }
            }
            stats.planned.push(planned);
        }

        info!(
            entity = %E::KIND,
            dry_run = self.dry_run,
            planned_creates = stats.planned_count(Action::Create),
            planned_deletes = stats.planned_count(Action::Delete),
            created = stats.created,
            deleted = stats.deleted,
            skipped = stats.skipped.len(),
            failed = stats.failed,
            "Sync phase finished"
        );

        stats
    }

    fn plan<P: Serialize>(
        &self,
        action: Action,
        kind: EntityKind,
        label: String,
        payload: &P,
    ) -> PlannedAction {
        let payload = render_payload(kind, &label, payload);
        let planned = PlannedAction {
            dry_run: self.dry_run,
            action,
            kind,
            label,
            payload,
        };
        info!(
            entity = %kind,
            action = %action,
            name = %planned.label,
            dry_run = self.dry_run,
            "{planned}"
        );
        planned
    }

    fn record_failure(&self, stats: &mut SyncStats, planned: &PlannedAction, cause: SyncError) {
        let err = SyncError::Mutation {
            action: planned.action.as_str(),
            kind: planned.kind,
            name: planned.label.clone(),
            message: cause.to_string(),
        };
        error!(
            entity = %planned.kind,
            action = %planned.action,
            name = %planned.label,
            "[error] {err}"
        );
        stats.failed += 1;
    }

    async fn send_create(&self, request: &CreateRequest) -> SyncResult<()> {
        match request {
            CreateRequest::Group(r) => self.target.create_group(r).await,
            CreateRequest::User(r) => self.target.create_user(r).await,
            CreateRequest::Membership(r) => self.target.create_membership(r).await,
        }
    }

    async fn send_delete(&self, request: &DeleteRequest) -> SyncResult<()> {
        match request {
            DeleteRequest::Group(r) => self.target.delete_group(r).await,
            DeleteRequest::User(r) => self.target.delete_user(r).await,
            DeleteRequest::Membership(r) => self.target.delete_membership(r).await,
        }
    }
}

/// JSON rendering of a payload for the planned-action line.
///
/// A payload that cannot be serialized is reported and rendered as a
/// placeholder naming the error.
fn render_payload<P: Serialize>(kind: EntityKind, label: &str, payload: &P) -> String {
    serde_json::to_string(payload).unwrap_or_else(|e| {
        error!(entity = %kind, name = %label, error = %e, "Failed to serialize payload");
        format!("<unserializable payload: {e}>")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("boom"))
        }
    }

    #[test]
    fn test_render_payload() {
        let payload = crate::payload::CreateGroupRequest {
            display_name: "team-a".into(),
        };
        assert_eq!(
            render_payload(EntityKind::Groups, "team-a", &payload),
            r#"{"DisplayName":"team-a"}"#
        );
    }

    #[test]
    fn test_render_payload_reports_serialization_failure() {
        let rendered = render_payload(EntityKind::Groups, "team-a", &Unserializable);
        assert_eq!(rendered, "<unserializable payload: boom>");
    }

    #[test]
    fn test_planned_action_line() {
        let live = PlannedAction {
            dry_run: false,
            action: Action::Create,
            kind: EntityKind::Groups,
            label: "team-a".into(),
            payload: r#"{"DisplayName":"team-a"}"#.into(),
        };
        assert_eq!(
            live.to_string(),
            r#"[create] [groups] [team-a] {"DisplayName":"team-a"}"#
        );

        let dry = PlannedAction {
            dry_run: true,
            ..live
        };
        assert_eq!(
            dry.to_string(),
            r#"DRYRUN: [create] [groups] [team-a] {"DisplayName":"team-a"}"#
        );
    }

    #[test]
    fn test_skip_line() {
        let skipped = SkippedDelete {
            kind: EntityKind::Groups,
            label: "azure-aws-sso-admins".into(),
            reason: SkipReason::ProtectedGroupPrefix("azure-aws-sso-".into()),
        };
        assert_eq!(
            skipped.to_string(),
            "Skipping deletion of groups 'azure-aws-sso-admins': name starts with protected prefix 'azure-aws-sso-'"
        );
    }

    #[test]
    fn test_stats_merge() {
        let mut total = SyncStats::new(EntityKind::Memberships);
        let mut batch = SyncStats::new(EntityKind::Memberships);
        batch.created = 2;
        batch.failed = 1;
        total.merge(batch.clone());
        total.merge(batch);
        assert_eq!(total.created, 4);
        assert_eq!(total.failed, 2);
    }
}
