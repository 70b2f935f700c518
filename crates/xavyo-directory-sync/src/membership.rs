//! Per-group membership reconciliation.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::model::{normalize_name, GroupRef, Membership, MembershipRecord, SourceMember, User};
use crate::reconcile::{reconcile, ReconcileResult};

/// Diffs one group's source roster against its target memberships.
///
/// Target records are resolved to users by identifier and source members by
/// normalized name, both against the refreshed user snapshot. Either side's
/// unresolvable entries are logged and left out. A source member without a
/// target user becomes eligible once the user phase has created it.
pub fn reconcile_memberships(
    group: &GroupRef,
    source_members: &[SourceMember],
    target_memberships: &[MembershipRecord],
    target_users: &[User],
) -> ReconcileResult<Membership> {
    let users_by_id: HashMap<&str, &User> = target_users
        .iter()
        .filter_map(|u| u.id.as_deref().map(|id| (id, u)))
        .collect();
    let users_by_name: HashMap<String, &User> = target_users
        .iter()
        .filter(|u| u.id.is_some())
        .map(|u| (normalize_name(&u.name), u))
        .collect();

    let current: Vec<Membership> = target_memberships
        .iter()
        .filter_map(|record| match users_by_id.get(record.user_id.as_str()) {
            Some(user) => Some(Membership {
                membership_id: Some(record.membership_id.clone()),
                user_id: record.user_id.clone(),
                name: user.name.clone(),
                group: group.clone(),
            }),
            None => {
                warn!(
                    group = %group.name,
                    membership_id = %record.membership_id,
                    user_id = %record.user_id,
                    "Membership references a user missing from the user snapshot, ignoring"
                );
                None
            }
        })
        .collect();

    let desired: Vec<Membership> = source_members
        .iter()
        .filter_map(|member| {
            let key = normalize_name(&member.name);
            match users_by_name.get(&key) {
                Some(user) => user.id.as_ref().map(|id| Membership {
                    membership_id: None,
                    user_id: id.clone(),
                    name: user.name.clone(),
                    group: group.clone(),
                }),
                None => {
                    info!(
                        group = %group.name,
                        member = %key,
                        "Member has no target user yet, membership pending"
                    );
                    None
                }
            }
        })
        .collect();

    reconcile(&current, &desired)
}
