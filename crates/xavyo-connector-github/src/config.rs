//! GitHub connector configuration.

use std::env::VarError;
use std::fmt;

use secrecy::SecretString;
use xavyo_directory_sync::config::require_vars;
use xavyo_directory_sync::ConfigError;

/// Default REST and GraphQL API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GraphQL connections return at most 100 nodes per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// How the connector authenticates against GitHub.
pub enum GitHubCredentials {
    /// A personal access or pre-minted installation token.
    Token(SecretString),
    /// A GitHub App exchanging a signed JWT for installation tokens.
    App {
        app_id: String,
        /// PEM encoded RSA private key.
        private_key: SecretString,
        installation_id: String,
    },
}

impl fmt::Debug for GitHubCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token([REDACTED])"),
            Self::App {
                app_id,
                installation_id,
                ..
            } => f
                .debug_struct("App")
                .field("app_id", app_id)
                .field("installation_id", installation_id)
                .finish_non_exhaustive(),
        }
    }
}

/// GitHub organisation source settings.
#[derive(Debug)]
pub struct GitHubConfig {
    pub organisation: String,
    pub api_url: String,
    pub page_size: u32,
    pub credentials: GitHubCredentials,
}

impl GitHubConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// `GITHUB_TOKEN` wins over the App credentials when both are present.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let credentials = match reader("GITHUB_TOKEN") {
            Ok(token) if !token.trim().is_empty() => {
                require_vars(&reader, &["GITHUB_ORGANISATION"])?;
                GitHubCredentials::Token(SecretString::from(token.trim().to_string()))
            }
            _ => {
                require_vars(
                    &reader,
                    &[
                        "GITHUB_ORGANISATION",
                        "GITHUB_APP_ID",
                        "GITHUB_APP_PRIVATE_KEY",
                        "GITHUB_APP_INSTALLATION_ID",
                    ],
                )?;
                GitHubCredentials::App {
                    app_id: reader("GITHUB_APP_ID").unwrap_or_default().trim().to_string(),
                    private_key: SecretString::from(unescape_key(
                        &reader("GITHUB_APP_PRIVATE_KEY").unwrap_or_default(),
                    )),
                    installation_id: reader("GITHUB_APP_INSTALLATION_ID")
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                }
            }
        };

        let api_url = reader("GITHUB_API_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let page_size = match reader("GITHUB_PAGE_SIZE") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=100).contains(n))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "GITHUB_PAGE_SIZE".into(),
                        format!("expected 1-100, got '{value}'"),
                    )
                })?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            organisation: reader("GITHUB_ORGANISATION")
                .unwrap_or_default()
                .trim()
                .to_string(),
            api_url,
            page_size,
            credentials,
        })
    }
}

/// Keys stored in single-line variables carry literal `\n` sequences.
fn unescape_key(raw: &str) -> String {
    raw.trim().replace("\\n", "\n")
}
