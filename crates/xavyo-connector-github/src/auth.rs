//! GitHub App authentication with installation token caching.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{GitHubCredentials, GitHubError, GitHubResult};

/// App JWTs may live at most ten minutes.
const APP_JWT_LIFETIME_SECS: i64 = 600;

/// Back-dates `iat` to absorb clock drift with GitHub.
const APP_JWT_CLOCK_SKEW_SECS: i64 = 60;

/// Claims of the JWT a GitHub App signs to authenticate as itself.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Installation access token response.
#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Hands out bearer tokens for the GraphQL API.
///
/// Static tokens are returned as-is; App credentials are exchanged for an
/// installation token that is reused until shortly before it expires.
#[derive(Debug)]
pub struct TokenCache {
    credentials: GitHubCredentials,
    api_url: String,
    http_client: reqwest::Client,
    cached_token: RwLock<Option<CachedToken>>,
    /// Grace period before expiry to trigger refresh (default: 5 minutes).
    grace_period: Duration,
}

impl TokenCache {
    pub fn new(
        credentials: GitHubCredentials,
        api_url: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            credentials,
            api_url: api_url.into(),
            http_client,
            cached_token: RwLock::new(None),
            grace_period: Duration::minutes(5),
        }
    }

    /// Gets a valid access token, refreshing if necessary.
    #[instrument(skip(self))]
    pub async fn get_token(&self) -> GitHubResult<String> {
        let (app_id, private_key, installation_id) = match &self.credentials {
            GitHubCredentials::Token(token) => return Ok(token.expose_secret().to_string()),
            GitHubCredentials::App {
                app_id,
                private_key,
                installation_id,
            } => (app_id, private_key, installation_id),
        };

        {
            let cache = self.cached_token.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace_period) {
                    debug!("Using cached installation token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!(installation_id = %installation_id, "Refreshing installation token");
        let jwt = app_jwt(app_id, private_key.expose_secret(), Utc::now().timestamp())?;
        let new_token = self.acquire_token(&jwt, installation_id).await?;

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    async fn acquire_token(&self, jwt: &str, installation_id: &str) -> GitHubResult<CachedToken> {
        let token_url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url, installation_id
        );

        let response = self
            .http_client
            .post(&token_url)
            .bearer_auth(jwt)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| GitHubError::Auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: InstallationTokenResponse = response
            .json()
            .await
            .map_err(|e| GitHubError::Auth(format!("Failed to parse token response: {e}")))?;

        debug!(
            "Acquired installation token, expires at {}",
            token_response.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(CachedToken {
            access_token: token_response.token,
            expires_at: token_response.expires_at,
        })
    }

    /// Invalidates the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }
}

/// Signs the RS256 JWT identifying the App, valid from `now`.
pub(crate) fn app_jwt(app_id: &str, private_key_pem: &str, now: i64) -> GitHubResult<String> {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| GitHubError::Config(format!("Invalid GitHub App private key: {e}")))?;

    let claims = AppClaims {
        iat: now - APP_JWT_CLOCK_SKEW_SECS,
        exp: now + APP_JWT_LIFETIME_SECS,
        iss: app_id.to_string(),
    };

    encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(GitHubError::from)
}
