//! Common test utilities for xavyo-connector-github integration tests.

#![allow(dead_code)]

use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

use xavyo_connector_github::{GitHubClient, GitHubConfig, GitHubCredentials};

pub const ORG: &str = "acme";

/// A GraphQL connection of logins.
pub fn members(logins: &[&str], next: Option<&str>) -> Value {
    json!({
        "nodes": logins.iter().map(|l| json!({ "login": l })).collect::<Vec<_>>(),
        "pageInfo": { "hasNextPage": next.is_some(), "endCursor": next },
    })
}

/// A team node whose inline member page may be truncated.
pub fn team(slug: &str, logins: &[&str], members_next: Option<&str>) -> Value {
    json!({ "slug": slug, "members": members(logins, members_next) })
}

pub fn teams_response(nodes: Vec<Value>, next: Option<&str>) -> Value {
    json!({
        "data": { "organization": { "teams": {
            "nodes": nodes,
            "pageInfo": { "hasNextPage": next.is_some(), "endCursor": next },
        } } }
    })
}

pub fn team_members_response(logins: &[&str], next: Option<&str>) -> Value {
    json!({ "data": { "organization": { "team": { "members": members(logins, next) } } } })
}

pub fn org_members_response(logins: &[&str], next: Option<&str>) -> Value {
    json!({ "data": { "organization": { "membersWithRole": members(logins, next) } } })
}

pub fn graphql_error(kind: &str, message: &str) -> Value {
    json!({ "data": null, "errors": [{ "type": kind, "message": message }] })
}

/// GraphQL request for the teams query starting at `after`.
pub fn teams_request(after: Option<&str>) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("teams(first"))
        .and(body_partial_json(json!({ "variables": { "after": after } })))
}

/// GraphQL request for one team's members starting at `after`.
pub fn team_members_request(slug: &str, after: &str) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(
            json!({ "variables": { "slug": slug, "after": after } }),
        ))
}

/// GraphQL request for the organisation member query starting at `after`.
pub fn org_members_request(after: Option<&str>) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("membersWithRole"))
        .and(body_partial_json(json!({ "variables": { "after": after } })))
}

pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Client authenticating with a static token against the mock server.
pub fn token_client(server: &MockServer, page_size: u32) -> GitHubClient {
    GitHubClient::new(GitHubConfig {
        organisation: ORG.to_string(),
        api_url: server.uri(),
        page_size,
        credentials: GitHubCredentials::Token(SecretString::from("ghp_test".to_string())),
    })
    .unwrap()
}
