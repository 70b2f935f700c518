//! GitHub GraphQL client reading teams and organisation members.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use xavyo_directory_sync::{
    Page, PagedFetcher, SourceDirectory, SourceMember, SourceTeam, SyncError, SyncResult,
};

use crate::auth::TokenCache;
use crate::{GitHubConfig, GitHubError, GitHubResult};

pub(crate) const USER_AGENT: &str = "xavyo-directory-sync";

const TEAMS_QUERY: &str = r"
query($org: String!, $first: Int!, $after: String) {
  organization(login: $org) {
    teams(first: $first, after: $after) {
      nodes {
        slug
        members(first: $first) {
          nodes { login }
          pageInfo { hasNextPage endCursor }
        }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}";

const TEAM_MEMBERS_QUERY: &str = r"
query($org: String!, $slug: String!, $first: Int!, $after: String) {
  organization(login: $org) {
    team(slug: $slug) {
      members(first: $first, after: $after) {
        nodes { login }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}";

const ORG_MEMBERS_QUERY: &str = r"
query($org: String!, $first: Int!, $after: String) {
  organization(login: $org) {
    membersWithRole(first: $first, after: $after) {
      nodes { login }
      pageInfo { hasNextPage endCursor }
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    nodes: Vec<T>,
    page_info: PageInfo,
}

impl<T> Connection<T> {
    fn into_page(self) -> Page<T> {
        match self.page_info.end_cursor {
            Some(cursor) if self.page_info.has_next_page => Page::with_next(self.nodes, cursor),
            _ => Page::last(self.nodes),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct MemberNode {
    login: String,
}

#[derive(Debug, Deserialize, Clone)]
struct TeamNode {
    slug: String,
    members: Connection<MemberNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationData<T> {
    organization: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TeamsField {
    teams: Connection<TeamNode>,
}

#[derive(Debug, Deserialize)]
struct TeamField {
    team: Option<TeamMembersField>,
}

#[derive(Debug, Deserialize)]
struct TeamMembersField {
    members: Connection<MemberNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersWithRoleField {
    members_with_role: Connection<MemberNode>,
}

/// Reads an organisation's teams and members through the GraphQL API.
#[derive(Debug)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    token_cache: TokenCache,
    graphql_url: String,
    organisation: String,
    page_size: u32,
    fetcher: PagedFetcher,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GitHubError::Config(format!("Failed to create HTTP client: {e}")))?;

        let token_cache = TokenCache::new(
            config.credentials,
            config.api_url.clone(),
            http_client.clone(),
        );

        Ok(Self {
            http_client,
            token_cache,
            graphql_url: format!("{}/graphql", config.api_url),
            organisation: config.organisation,
            page_size: config.page_size,
            fetcher: PagedFetcher::default(),
        })
    }

    /// Replaces the pager, e.g. to apply the configured throttle backoff.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: PagedFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Runs one GraphQL query and returns its `data`.
    #[instrument(skip(self, query, variables))]
    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> GitHubResult<T> {
        let token = self.token_cache.get_token().await?;

        let response = self
            .http_client
            .post(&self.graphql_url)
            .bearer_auth(&token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let status = response.status();

        if let Some(retry_after) = throttle_hint(status, response.headers()) {
            warn!(status = %status, ?retry_after, "GitHub rate limit hit");
            return Err(GitHubError::RateLimited { retry_after });
        }

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.token_cache.invalidate().await;
            }
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GraphQlResponse<T> = response.json().await?;

        if body
            .errors
            .iter()
            .any(|e| e.kind.as_deref() == Some("RATE_LIMITED"))
        {
            warn!("GitHub GraphQL rate limit hit");
            return Err(GitHubError::RateLimited { retry_after: None });
        }
        if !body.errors.is_empty() {
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| GitHubError::GraphQl("response without data".to_string()))
    }

    async fn teams_page(&self, after: Option<String>) -> GitHubResult<Page<TeamNode>> {
        let data: OrganizationData<TeamsField> = self
            .graphql(
                TEAMS_QUERY,
                json!({ "org": self.organisation, "first": self.page_size, "after": after }),
            )
            .await?;
        Ok(self.organization(data)?.teams.into_page())
    }

    async fn team_members_page(
        &self,
        slug: &str,
        after: Option<String>,
    ) -> GitHubResult<Page<MemberNode>> {
        let data: OrganizationData<TeamField> = self
            .graphql(
                TEAM_MEMBERS_QUERY,
                json!({
                    "org": self.organisation,
                    "slug": slug,
                    "first": self.page_size,
                    "after": after,
                }),
            )
            .await?;
        let team = self
            .organization(data)?
            .team
            .ok_or_else(|| GitHubError::GraphQl(format!("team '{slug}' not found")))?;
        Ok(team.members.into_page())
    }

    async fn org_members_page(&self, after: Option<String>) -> GitHubResult<Page<MemberNode>> {
        let data: OrganizationData<MembersWithRoleField> = self
            .graphql(
                ORG_MEMBERS_QUERY,
                json!({ "org": self.organisation, "first": self.page_size, "after": after }),
            )
            .await?;
        Ok(self.organization(data)?.members_with_role.into_page())
    }

    fn organization<T>(&self, data: OrganizationData<T>) -> GitHubResult<T> {
        data.organization.ok_or_else(|| {
            GitHubError::GraphQl(format!("organisation '{}' not found", self.organisation))
        })
    }

    /// Logins of a team whose inline member page was truncated.
    async fn complete_members(&self, team: &TeamNode) -> SyncResult<Vec<MemberNode>> {
        let mut members = team.members.nodes.clone();
        let Some(start) = team
            .members
            .page_info
            .end_cursor
            .clone()
            .filter(|_| team.members.page_info.has_next_page)
        else {
            return Ok(members);
        };

        debug!(team = %team.slug, "Fetching remaining team members");
        let rest = self
            .fetcher
            .fetch_all(&format!("list members of team {}", team.slug), |cursor| {
                let after = cursor.or_else(|| Some(start.clone()));
                async move {
                    self.team_members_page(&team.slug, after)
                        .await
                        .map_err(SyncError::from)
                }
            })
            .await?;
        members.extend(rest);
        Ok(members)
    }
}

#[async_trait]
impl SourceDirectory for GitHubClient {
    #[instrument(skip(self, ignore_list), fields(organisation = %self.organisation))]
    async fn fetch_teams(&self, ignore_list: &[String]) -> SyncResult<Vec<SourceTeam>> {
        let nodes = self
            .fetcher
            .fetch_all("list teams", |cursor| async move {
                self.teams_page(cursor).await.map_err(SyncError::from)
            })
            .await?;

        let mut teams = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let slug = node.slug.to_lowercase();
            if ignore_list.contains(&slug) {
                debug!(team = %slug, "Ignoring team");
                continue;
            }
            let members = self.complete_members(node).await?;
            teams.push(SourceTeam::new(&slug, members.iter().map(|m| &m.login)));
        }

        info!(teams = teams.len(), ignored = nodes.len() - teams.len(), "Fetched GitHub teams");
        Ok(teams)
    }

    #[instrument(skip(self), fields(organisation = %self.organisation))]
    async fn fetch_org_members(&self) -> SyncResult<Vec<SourceMember>> {
        let nodes = self
            .fetcher
            .fetch_all("list organisation members", |cursor| async move {
                self.org_members_page(cursor).await.map_err(SyncError::from)
            })
            .await?;

        info!(members = nodes.len(), "Fetched GitHub organisation members");
        Ok(nodes.iter().map(|m| SourceMember::new(&m.login)).collect())
    }
}

/// Returns `Some(wait)` when the response signals a rate limit.
///
/// 429 is always a rate limit; 403 only when it carries `Retry-After` or an
/// exhausted `x-ratelimit-remaining`.
fn throttle_hint(status: StatusCode, headers: &HeaderMap) -> Option<Option<Duration>> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };
    let retry_after = header("retry-after")
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);
    let exhausted = header("x-ratelimit-remaining") == Some("0");

    let throttled = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (retry_after.is_some() || exhausted));
    if !throttled {
        return None;
    }

    let until_reset = || {
        header("x-ratelimit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .map(|reset| Duration::from_secs((reset - Utc::now().timestamp()).max(0) as u64))
    };
    Some(retry_after.or_else(|| exhausted.then(until_reset).flatten()))
}
