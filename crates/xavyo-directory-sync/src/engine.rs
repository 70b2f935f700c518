//! The ordered groups → users → memberships pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{SyncConfig, UserSource};
use crate::entity::PayloadContext;
use crate::error::SyncResult;
use crate::executor::{SyncExecutor, SyncStats};
use crate::fetch::PagedFetcher;
use crate::membership::reconcile_memberships;
use crate::model::{normalize_name, EntityKind, Group, GroupRef, SourceTeam, User};
use crate::reconcile::reconcile;
use crate::traits::{SourceDirectory, TargetStore};

/// Outcome of a complete run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dry_run: bool,
    pub groups: SyncStats,
    pub users: SyncStats,
    pub memberships: SyncStats,
    /// Source teams without a matching target group, skipped for this run.
    pub unmatched_teams: Vec<String>,
}

impl RunSummary {
    /// Failed per-item mutations across all phases.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.groups.failed + self.users.failed + self.memberships.failed
    }
}

/// Runs one sync invocation against explicit collaborators.
pub struct SyncEngine {
    source: Arc<dyn SourceDirectory>,
    target: Arc<dyn TargetStore>,
    config: SyncConfig,
    fetcher: PagedFetcher,
    executor: SyncExecutor,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn SourceDirectory>,
        target: Arc<dyn TargetStore>,
        config: SyncConfig,
    ) -> Self {
        let fetcher = PagedFetcher::new(config.throttle_min_backoff);
        let executor = SyncExecutor::new(
            Arc::clone(&target),
            config.dry_run,
            config.skip_policy.clone(),
            PayloadContext {
                email_suffix: config.email_suffix.clone(),
            },
        );
        Self {
            source,
            target,
            config,
            fetcher,
            executor,
        }
    }

    /// Syncs groups, then users, then memberships.
    ///
    /// A fetch failure aborts the remaining phases; phases already applied
    /// stay applied.
    #[instrument(skip(self), fields(dry_run = self.config.dry_run))]
    pub async fn run(&self) -> SyncResult<RunSummary> {
        info!(
            user_source = %self.config.user_source,
            ignored_teams = ?self.config.teams_ignore_list,
            "Starting directory sync"
        );

        let teams = self
            .source
            .fetch_teams(&self.config.teams_ignore_list)
            .await?;
        info!(teams = teams.len(), "Fetched source teams");

        let groups = self.sync_groups(&teams).await?;
        let users = self.sync_users(&teams).await?;
        let (memberships, unmatched_teams) = self.sync_memberships(&teams).await?;

        let summary = RunSummary {
            dry_run: self.config.dry_run,
            groups,
            users,
            memberships,
            unmatched_teams,
        };
        info!(
            failed = summary.failed(),
            unmatched_teams = summary.unmatched_teams.len(),
            "Directory sync finished"
        );
        Ok(summary)
    }

    async fn sync_groups(&self, teams: &[SourceTeam]) -> SyncResult<SyncStats> {
        let source_groups: Vec<Group> = teams.iter().map(|t| Group::named(&t.name)).collect();
        let target_groups = self.fetch_groups().await?;

        let result = reconcile(&target_groups, &source_groups);
        Ok(self.executor.sync(&result).await)
    }

    async fn sync_users(&self, teams: &[SourceTeam]) -> SyncResult<SyncStats> {
        let source_users: Vec<User> = match self.config.user_source {
            UserSource::TeamMembers => distinct_members(teams),
            UserSource::OrgMembers => self
                .source
                .fetch_org_members()
                .await?
                .iter()
                .map(|m| User::named(&m.name))
                .collect(),
        };
        let target_users = self.fetch_users().await?;

        let result = reconcile(&target_users, &source_users);
        Ok(self.executor.sync(&result).await)
    }

    async fn sync_memberships(
        &self,
        teams: &[SourceTeam],
    ) -> SyncResult<(SyncStats, Vec<String>)> {
        // Groups and users created by the previous phases get their ids here.
        let groups = self.fetch_groups().await?;
        let users = self.fetch_users().await?;

        let groups_by_name: HashMap<String, &Group> = groups
            .iter()
            .map(|g| (normalize_name(&g.name), g))
            .collect();

        let mut stats = SyncStats::new(EntityKind::Memberships);
        let mut unmatched = Vec::new();

        for team in teams {
            let Some(group_id) = groups_by_name
                .get(&normalize_name(&team.name))
                .and_then(|g| g.id.clone())
            else {
                warn!(team = %team.name, "No target group for team, skipping memberships");
                unmatched.push(team.name.clone());
                continue;
            };

            let group = GroupRef {
                id: group_id,
                name: team.name.clone(),
            };
            let records = self
                .fetcher
                .fetch_all(&format!("list memberships of {}", group.name), |token| {
                    let target = Arc::clone(&self.target);
                    let group_id = group.id.clone();
                    async move { target.list_group_memberships(&group_id, token).await }
                })
                .await?;

            let result = reconcile_memberships(&group, &team.members, &records, &users);
            stats.merge(self.executor.sync(&result).await);
        }

        Ok((stats, unmatched))
    }

    async fn fetch_groups(&self) -> SyncResult<Vec<Group>> {
        self.fetcher
            .fetch_snapshot("list groups", |token| {
                let target = Arc::clone(&self.target);
                async move { target.list_groups(token).await }
            })
            .await
    }

    async fn fetch_users(&self) -> SyncResult<Vec<User>> {
        self.fetcher
            .fetch_snapshot("list users", |token| {
                let target = Arc::clone(&self.target);
                async move { target.list_users(token).await }
            })
            .await
    }
}

/// Every member of every team, once, in first-seen order.
fn distinct_members(teams: &[SourceTeam]) -> Vec<User> {
    let mut seen = HashSet::new();
    teams
        .iter()
        .flat_map(|t| t.members.iter())
        .filter(|m| seen.insert(normalize_name(&m.name)))
        .map(|m| User::named(&m.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_members_across_teams() {
        let teams = vec![
            SourceTeam::new("platform", ["alice", "carol"]),
            SourceTeam::new("security", ["Carol", "dave"]),
        ];
        let names: Vec<String> = distinct_members(&teams).into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["alice", "carol", "dave"]);
    }
}
