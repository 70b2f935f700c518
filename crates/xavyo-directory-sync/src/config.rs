//! Engine configuration loaded from environment variables.

use std::env::VarError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::fetch::DEFAULT_MIN_BACKOFF;
use crate::skip::SkipPolicy;

/// Team slug excluded from sync unless overridden.
pub const DEFAULT_TEAMS_IGNORE_LIST: &str = "all-org-members";

/// Group prefix reserved for groups provisioned by the identity federation.
pub const DEFAULT_PROTECTED_GROUP_PREFIX: &str = "azure-aws-sso-";

/// User name suffix of federated accounts that are never deleted.
pub const DEFAULT_PROTECTED_USER_SUFFIX: &str = "@justice.gov.uk";

/// Where the user snapshot of the source comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSource {
    /// Distinct members across all synced teams.
    #[default]
    TeamMembers,
    /// The flat organisation member list.
    OrgMembers,
}

impl FromStr for UserSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "teams" | "team_members" => Ok(Self::TeamMembers),
            "org" | "org_members" => Ok(Self::OrgMembers),
            other => Err(format!("expected 'teams' or 'org', got '{other}'")),
        }
    }
}

impl fmt::Display for UserSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TeamMembers => f.write_str("teams"),
            Self::OrgMembers => f.write_str("org"),
        }
    }
}

/// Settings consumed by the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Suppresses every mutating call. Read once, never changes during a run.
    pub dry_run: bool,
    /// Appended to source names to form target user names.
    pub email_suffix: String,
    /// Source teams excluded from sync.
    pub teams_ignore_list: Vec<String>,
    pub user_source: UserSource,
    pub skip_policy: SkipPolicy,
    /// Wait before retrying a throttled page when the provider gives no hint.
    pub throttle_min_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            email_suffix: String::new(),
            teams_ignore_list: vec![DEFAULT_TEAMS_IGNORE_LIST.to_string()],
            user_source: UserSource::default(),
            skip_policy: SkipPolicy::none()
                .with_group_prefix(DEFAULT_PROTECTED_GROUP_PREFIX)
                .with_user_suffix(DEFAULT_PROTECTED_USER_SUFFIX),
            throttle_min_backoff: DEFAULT_MIN_BACKOFF,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Tests supply variables through the reader instead of mutating the
    /// process environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        require_vars(&reader, &["SSO_EMAIL_SUFFIX"])?;

        // Live only when NOT_DRY_RUN is set to something other than "false".
        let dry_run = match reader("NOT_DRY_RUN") {
            Ok(value) => value.trim().eq_ignore_ascii_case("false"),
            Err(_) => true,
        };

        let email_suffix = reader("SSO_EMAIL_SUFFIX").unwrap_or_default();

        let teams_ignore_list = parse_list(
            &reader("GITHUB_TEAMS_IGNORE_LIST")
                .unwrap_or_else(|_| DEFAULT_TEAMS_IGNORE_LIST.to_string()),
        );

        let user_source = reader("SYNC_USER_SOURCE")
            .ok()
            .map(|v| v.parse::<UserSource>())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue("SYNC_USER_SOURCE".into(), e))?
            .unwrap_or_default();

        let skip_policy = SkipPolicy {
            protected_group_prefixes: parse_list(
                &reader("SYNC_PROTECTED_GROUP_PREFIXES")
                    .unwrap_or_else(|_| DEFAULT_PROTECTED_GROUP_PREFIX.to_string()),
            ),
            protected_user_suffixes: parse_list(
                &reader("SYNC_PROTECTED_USER_SUFFIXES")
                    .unwrap_or_else(|_| DEFAULT_PROTECTED_USER_SUFFIX.to_string()),
            ),
            external_email_types: parse_list(
                &reader("SYNC_EXTERNAL_EMAIL_TYPES").unwrap_or_default(),
            ),
        };

        let throttle_min_backoff = match reader("SYNC_THROTTLE_MIN_BACKOFF_SECS") {
            Ok(value) => Duration::from_secs(value.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SYNC_THROTTLE_MIN_BACKOFF_SECS".into(), e.to_string())
            })?),
            Err(_) => DEFAULT_MIN_BACKOFF,
        };

        Ok(Self {
            dry_run,
            email_suffix,
            teams_ignore_list,
            user_source,
            skip_policy,
            throttle_min_backoff,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Fails with every absent variable of `names`, in the given order.
///
/// A variable set to an empty string counts as present.
pub fn require_vars<F>(reader: &F, names: &[&str]) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let missing: Vec<String> = names
        .iter()
        .copied()
        .filter(|name| reader(name).is_err())
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingVars(missing))
    }
}

/// Splits a comma separated list, trimming and dropping empty entries.
#[must_use]
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Create a reader closure from a HashMap (no global env mutation).
    fn make_reader(vars: HashMap<&str, &str>) -> impl Fn(&str) -> Result<String, VarError> {
        let owned: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| owned.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_missing_suffix() {
        let err = SyncConfig::from_reader(make_reader(HashMap::new())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVars(ref v) if v == &["SSO_EMAIL_SUFFIX"]));
        assert_eq!(err.to_string(), "Missing variables: SSO_EMAIL_SUFFIX");
    }

    #[test]
    fn test_defaults() {
        let config =
            SyncConfig::from_reader(make_reader(HashMap::from([("SSO_EMAIL_SUFFIX", "")])))
                .unwrap();

        assert!(config.dry_run);
        assert_eq!(config.email_suffix, "");
        assert_eq!(config.teams_ignore_list, vec!["all-org-members"]);
        assert_eq!(config.user_source, UserSource::TeamMembers);
        assert_eq!(
            config.skip_policy.protected_group_prefixes,
            vec!["azure-aws-sso-"]
        );
        assert_eq!(
            config.skip_policy.protected_user_suffixes,
            vec!["@justice.gov.uk"]
        );
        assert!(config.skip_policy.external_email_types.is_empty());
        assert_eq!(config.throttle_min_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_default_matches_env_defaults() {
        let from_env =
            SyncConfig::from_reader(make_reader(HashMap::from([("SSO_EMAIL_SUFFIX", "")])))
                .unwrap();
        let default = SyncConfig::default();

        assert_eq!(
            default.skip_policy.protected_group_prefixes,
            from_env.skip_policy.protected_group_prefixes
        );
        assert_eq!(
            default.skip_policy.protected_user_suffixes,
            from_env.skip_policy.protected_user_suffixes
        );
    }

    #[test]
    fn test_empty_protected_suffixes_disable_user_rule() {
        let config = SyncConfig::from_reader(make_reader(HashMap::from([
            ("SSO_EMAIL_SUFFIX", ""),
            ("SYNC_PROTECTED_USER_SUFFIXES", ""),
        ])))
        .unwrap();
        assert!(config.skip_policy.protected_user_suffixes.is_empty());
    }

    #[test]
    fn test_dry_run_flag() {
        let dry_run_for = |value: &str| {
            SyncConfig::from_reader(make_reader(HashMap::from([
                ("SSO_EMAIL_SUFFIX", "@example.com"),
                ("NOT_DRY_RUN", value),
            ])))
            .unwrap()
            .dry_run
        };

        assert!(!dry_run_for("true"));
        assert!(!dry_run_for("1"));
        assert!(dry_run_for("false"));
        assert!(dry_run_for("FALSE"));
    }

    #[test]
    fn test_custom_values() {
        let config = SyncConfig::from_reader(make_reader(HashMap::from([
            ("SSO_EMAIL_SUFFIX", "@example.com"),
            ("GITHUB_TEAMS_IGNORE_LIST", "all-org-members, Bots ,"),
            ("SYNC_USER_SOURCE", "org"),
            ("SYNC_PROTECTED_GROUP_PREFIXES", "ext-,legacy-"),
            ("SYNC_PROTECTED_USER_SUFFIXES", "@Corp.example"),
            ("SYNC_EXTERNAL_EMAIL_TYPES", "EntraId"),
            ("SYNC_THROTTLE_MIN_BACKOFF_SECS", "5"),
        ])))
        .unwrap();

        assert_eq!(config.email_suffix, "@example.com");
        assert_eq!(config.teams_ignore_list, vec!["all-org-members", "bots"]);
        assert_eq!(config.user_source, UserSource::OrgMembers);
        assert_eq!(
            config.skip_policy.protected_group_prefixes,
            vec!["ext-", "legacy-"]
        );
        assert_eq!(
            config.skip_policy.protected_user_suffixes,
            vec!["@corp.example"]
        );
        assert_eq!(config.skip_policy.external_email_types, vec!["entraid"]);
        assert_eq!(config.throttle_min_backoff, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        let err = SyncConfig::from_reader(make_reader(HashMap::from([
            ("SSO_EMAIL_SUFFIX", ""),
            ("SYNC_USER_SOURCE", "ldap"),
        ])))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "SYNC_USER_SOURCE"));

        let err = SyncConfig::from_reader(make_reader(HashMap::from([
            ("SSO_EMAIL_SUFFIX", ""),
            ("SYNC_THROTTLE_MIN_BACKOFF_SECS", "soon"),
        ])))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
    }

    #[test]
    fn test_require_vars_lists_all_missing_in_order() {
        let reader = make_reader(HashMap::from([("B", "set")]));
        let err = require_vars(&reader, &["A", "B", "C"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing variables: A, C");
    }
}
