//! Identity Store connector configuration.

use std::env::VarError;

use xavyo_directory_sync::config::require_vars;
use xavyo_directory_sync::ConfigError;

/// The Identity Store list APIs return at most 100 records per page.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// AWS IAM Identity Store target settings.
#[derive(Debug, Clone)]
pub struct IdentityStoreConfig {
    pub region: String,
    pub identity_store_id: String,
    /// Appended to source names to form user names, stripped when listing.
    pub email_suffix: String,
    pub page_size: i32,
}

impl IdentityStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        require_vars(
            &reader,
            &["SSO_AWS_REGION", "SSO_EMAIL_SUFFIX", "SSO_IDENTITY_STORE_ID"],
        )?;

        let page_size = match reader("SSO_PAGE_SIZE") {
            Ok(value) => value
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|n| (1..=100).contains(n))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SSO_PAGE_SIZE".into(),
                        format!("expected 1-100, got '{value}'"),
                    )
                })?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            region: reader("SSO_AWS_REGION").unwrap_or_default().trim().to_string(),
            identity_store_id: reader("SSO_IDENTITY_STORE_ID")
                .unwrap_or_default()
                .trim()
                .to_string(),
            email_suffix: reader("SSO_EMAIL_SUFFIX").unwrap_or_default(),
            page_size,
        })
    }
}
