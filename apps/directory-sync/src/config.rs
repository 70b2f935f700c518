//! Process configuration assembled from the environment.

use std::env::VarError;

use xavyo_connector_github::GitHubConfig;
use xavyo_connector_identitystore::IdentityStoreConfig;
use xavyo_directory_sync::config::require_vars;
use xavyo_directory_sync::{ConfigError, SyncConfig};

const GITHUB_APP_VARS: [&str; 3] = [
    "GITHUB_APP_ID",
    "GITHUB_APP_PRIVATE_KEY",
    "GITHUB_APP_INSTALLATION_ID",
];

/// Everything one run needs.
#[derive(Debug)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub github: GitHubConfig,
    pub identity_store: IdentityStoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Reports every missing required variable at once before loading the
    /// per-component settings.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let has_token = reader("GITHUB_TOKEN").is_ok_and(|t| !t.trim().is_empty());

        let mut required = vec!["GITHUB_ORGANISATION"];
        if !has_token {
            required.extend(GITHUB_APP_VARS);
        }
        required.extend(["SSO_AWS_REGION", "SSO_EMAIL_SUFFIX", "SSO_IDENTITY_STORE_ID"]);
        require_vars(&reader, &required)?;

        Ok(Self {
            sync: SyncConfig::from_reader(&reader)?,
            github: GitHubConfig::from_reader(&reader)?,
            identity_store: IdentityStoreConfig::from_reader(&reader)?,
        })
    }
}
