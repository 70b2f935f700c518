//! In-memory collaborators for directory sync integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use xavyo_directory_sync::payload::{
    CreateGroupRequest, CreateMembershipRequest, CreateUserRequest, DeleteGroupRequest,
    DeleteMembershipRequest, DeleteUserRequest,
};
use xavyo_directory_sync::{
    Group, MembershipRecord, Page, SourceDirectory, SourceMember, SourceTeam, SyncConfig,
    SyncError, SyncResult, TargetStore, User, UserEmail,
};

pub const SUFFIX: &str = "@example.com";

/// Source directory returning fixed teams.
pub struct StaticSource {
    pub teams: Vec<SourceTeam>,
    pub org_members: Vec<SourceMember>,
}

impl StaticSource {
    pub fn new(teams: Vec<SourceTeam>) -> Self {
        Self {
            teams,
            org_members: Vec::new(),
        }
    }

    pub fn with_org_members<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.org_members = names.into_iter().map(SourceMember::new).collect();
        self
    }
}

#[async_trait]
impl SourceDirectory for StaticSource {
    async fn fetch_teams(&self, ignore_list: &[String]) -> SyncResult<Vec<SourceTeam>> {
        Ok(self
            .teams
            .iter()
            .filter(|t| !ignore_list.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn fetch_org_members(&self) -> SyncResult<Vec<SourceMember>> {
        Ok(self.org_members.clone())
    }
}

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    users: Vec<User>,
    memberships: HashMap<String, Vec<MembershipRecord>>,
    next_id: u32,
    calls: Vec<String>,
    failing: HashSet<String>,
    throttles: u32,
    broken_listing: Option<&'static str>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn user_name(&self, user_id: &str) -> String {
        self.users
            .iter()
            .find(|u| u.id.as_deref() == Some(user_id))
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn group_name(&self, group_id: &str) -> String {
        self.groups
            .iter()
            .find(|g| g.id.as_deref() == Some(group_id))
            .map(|g| g.name.clone())
            .unwrap_or_default()
    }

    fn check(&mut self, call: String, subject: &str) -> SyncResult<()> {
        self.calls.push(call);
        if self.failing.contains(subject) {
            return Err(SyncError::Target(format!("injected failure for {subject}")));
        }
        Ok(())
    }
}

/// Identity store kept in memory, recording every mutating call.
pub struct InMemoryTarget {
    state: Mutex<State>,
    page_size: usize,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: 2,
        }
    }

    pub fn with_group(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id("g");
            state.groups.push(Group::with_id(id, name));
        }
        self
    }

    pub fn with_user(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id("u");
            state.users.push(User::with_id(id, name));
        }
        self
    }

    pub fn with_user_emails(self, name: &str, emails: Vec<UserEmail>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id("u");
            state.users.push(User::with_id(id, name).with_emails(emails));
        }
        self
    }

    pub fn with_membership(self, group: &str, user: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let group_id = id_of(&state.groups, group);
            let user_id = state
                .users
                .iter()
                .find(|u| u.name == user)
                .and_then(|u| u.id.clone())
                .expect("user must exist");
            let membership_id = state.next_id("m");
            state
                .memberships
                .entry(group_id)
                .or_default()
                .push(MembershipRecord {
                    membership_id,
                    user_id,
                });
        }
        self
    }

    /// Mutations whose subject has this name fail.
    pub fn failing_for(self, subject: &str) -> Self {
        self.state.lock().unwrap().failing.insert(subject.to_string());
        self
    }

    /// The next `count` listing calls are throttled.
    pub fn throttled(self, count: u32) -> Self {
        self.state.lock().unwrap().throttles = count;
        self
    }

    /// Listing calls of `operation` ("groups", "users", "memberships") fail.
    pub fn broken_listing(self, operation: &'static str) -> Self {
        self.state.lock().unwrap().broken_listing = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().len()
    }

    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .groups
            .iter()
            .map(|g| g.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn user_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .map(|u| u.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn member_names(&self, group: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let group_id = id_of(&state.groups, group);
        let mut names: Vec<String> = state
            .memberships
            .get(&group_id)
            .map(|records| records.iter().map(|r| state.user_name(&r.user_id)).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn listing<T: Clone>(
        &self,
        operation: &'static str,
        items: impl FnOnce(&State) -> Vec<T>,
        next_token: Option<String>,
    ) -> SyncResult<Page<T>> {
        let mut state = self.state.lock().unwrap();
        if state.broken_listing == Some(operation) {
            return Err(SyncError::Target(format!("cannot list {operation}")));
        }
        if state.throttles > 0 {
            state.throttles -= 1;
            return Err(SyncError::Throttled {
                retry_after: Some(Duration::from_secs(2)),
            });
        }

        let all = items(&state);
        let offset: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (offset + self.page_size).min(all.len());
        let page = all[offset.min(all.len())..end].to_vec();
        Ok(if end < all.len() {
            Page::with_next(page, end.to_string())
        } else {
            Page::last(page)
        })
    }
}

fn id_of(groups: &[Group], name: &str) -> String {
    groups
        .iter()
        .find(|g| g.name == name)
        .and_then(|g| g.id.clone())
        .expect("group must exist")
}

#[async_trait]
impl TargetStore for InMemoryTarget {
    async fn list_groups(&self, next_token: Option<String>) -> SyncResult<Page<Group>> {
        self.listing("groups", |s| s.groups.clone(), next_token)
    }

    async fn list_users(&self, next_token: Option<String>) -> SyncResult<Page<User>> {
        self.listing("users", |s| s.users.clone(), next_token)
    }

    async fn list_group_memberships(
        &self,
        group_id: &str,
        next_token: Option<String>,
    ) -> SyncResult<Page<MembershipRecord>> {
        self.listing(
            "memberships",
            |s| s.memberships.get(group_id).cloned().unwrap_or_default(),
            next_token,
        )
    }

    async fn create_group(&self, request: &CreateGroupRequest) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.check(
            format!("create_group:{}", request.display_name),
            &request.display_name,
        )?;
        let id = state.next_id("g");
        state.groups.push(Group::with_id(id, &request.display_name));
        Ok(())
    }

    async fn delete_group(&self, request: &DeleteGroupRequest) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let name = state.group_name(&request.group_id);
        state.check(format!("delete_group:{name}"), &name)?;
        state
            .groups
            .retain(|g| g.id.as_deref() != Some(request.group_id.as_str()));
        Ok(())
    }

    async fn create_user(&self, request: &CreateUserRequest) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let name = request
            .user_name
            .strip_suffix(SUFFIX)
            .unwrap_or(&request.user_name)
            .to_string();
        state.check(format!("create_user:{name}"), &name)?;
        let id = state.next_id("u");
        state.users.push(User::with_id(id, &name));
        Ok(())
    }

    async fn delete_user(&self, request: &DeleteUserRequest) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let name = state.user_name(&request.user_id);
        state.check(format!("delete_user:{name}"), &name)?;
        state
            .users
            .retain(|u| u.id.as_deref() != Some(request.user_id.as_str()));
        Ok(())
    }

    async fn create_membership(&self, request: &CreateMembershipRequest) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let user = state.user_name(&request.member_id.user_id);
        let group = state.group_name(&request.group_id);
        state.check(format!("create_membership:{user}<=>{group}"), &user)?;
        let membership_id = state.next_id("m");
        state
            .memberships
            .entry(request.group_id.clone())
            .or_default()
            .push(MembershipRecord {
                membership_id,
                user_id: request.member_id.user_id.clone(),
            });
        Ok(())
    }

    async fn delete_membership(&self, request: &DeleteMembershipRequest) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let found = state.memberships.iter().find_map(|(group_id, records)| {
            records
                .iter()
                .find(|r| r.membership_id == request.membership_id)
                .map(|r| (group_id.clone(), r.user_id.clone()))
        });
        let (group_id, user_id) = found.unwrap_or_default();
        let user = state.user_name(&user_id);
        let group = state.group_name(&group_id);
        state.check(format!("delete_membership:{user}<=>{group}"), &user)?;
        if let Some(records) = state.memberships.get_mut(&group_id) {
            records.retain(|r| r.membership_id != request.membership_id);
        }
        Ok(())
    }
}

/// Engine configuration for tests: no skip rules unless added.
pub fn config(dry_run: bool) -> SyncConfig {
    SyncConfig {
        dry_run,
        email_suffix: SUFFIX.to_string(),
        teams_ignore_list: vec!["all-org-members".to_string()],
        skip_policy: Default::default(),
        ..SyncConfig::default()
    }
}
