use std::time::Duration;

use serde::de::Error;
use serde::{Deserialize, Deserializer};

pub const CONFIG_FILE_PATH: &str = "reviewbot.toml";

/// How long to wait after an event before re-reading pull request state, so that the
/// platform's own view of reviewers and assignees has converged.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3 * 60);

/// Configuration of a repository loaded from a `reviewbot.toml`
/// file located in the root of the repository file tree.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    #[serde(
        rename = "settle_delay_sec",
        default = "default_settle_delay",
        deserialize_with = "deserialize_duration_from_secs"
    )]
    pub settle_delay: Duration,
    #[serde(default)]
    pub labels: LabelConfig,
    /// Organization whose members may merge pull requests.
    /// The repository owner is used when missing.
    #[serde(default)]
    pub organization: Option<String>,
    /// Who gets assigned to open pull requests that are stuck in no known review state.
    #[serde(default)]
    pub fallback_assignee: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            labels: LabelConfig::default(),
            organization: None,
            fallback_assignee: None,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LabelConfig {
    #[serde(default = "default_lgtm_label")]
    pub lgtm: String,
    /// Matched case-insensitively against the start of label names.
    #[serde(default = "default_changelog_prefix")]
    pub changelog_prefix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            lgtm: default_lgtm_label(),
            changelog_prefix: default_changelog_prefix(),
        }
    }
}

fn default_settle_delay() -> Duration {
    DEFAULT_SETTLE_DELAY
}

fn default_lgtm_label() -> String {
    "PR: LGTM".to_string()
}

fn default_changelog_prefix() -> String {
    "PR CHANGELOG".to_string()
}

fn deserialize_duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i64::deserialize(deserializer)?;
    if seconds < 0 {
        return Err(D::Error::custom(format!(
            "Duration must not be negative, got {seconds}"
        )));
    }
    Ok(Duration::from_secs(seconds as u64))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot decode {CONFIG_FILE_PATH}: {0}")]
    Encoding(String),
    #[error("Cannot parse {CONFIG_FILE_PATH}: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parses the textual contents of a `reviewbot.toml` file.
pub fn parse_config(content: &str) -> Result<RepositoryConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{parse_config, RepositoryConfig, DEFAULT_SETTLE_DELAY};

    #[test]
    fn deserialize_empty() {
        let config = parse_config("").unwrap();
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert_eq!(config.labels.lgtm, "PR: LGTM");
        assert_eq!(config.labels.changelog_prefix, "PR CHANGELOG");
        assert_eq!(config.organization, None);
        assert_eq!(config.fallback_assignee, None);
    }

    #[test]
    fn empty_config_matches_default() {
        let parsed = parse_config("").unwrap();
        let default = RepositoryConfig::default();
        assert_eq!(parsed.settle_delay, default.settle_delay);
        assert_eq!(parsed.labels, default.labels);
    }

    #[test]
    fn deserialize_full() {
        let content = r#"
settle_delay_sec = 60
organization = "oppia"
fallback_assignee = "welfare-lead"

[labels]
lgtm = "lgtm"
changelog_prefix = "changelog"
"#;
        let config = parse_config(content).unwrap();
        assert_eq!(config.settle_delay, Duration::from_secs(60));
        assert_eq!(config.labels.lgtm, "lgtm");
        assert_eq!(config.labels.changelog_prefix, "changelog");
        assert_eq!(config.organization.as_deref(), Some("oppia"));
        assert_eq!(config.fallback_assignee.as_deref(), Some("welfare-lead"));
    }

    #[test]
    fn deserialize_partial_labels() {
        let config = parse_config("[labels]\nlgtm = \"ready\"").unwrap();
        assert_eq!(config.labels.lgtm, "ready");
        assert_eq!(config.labels.changelog_prefix, "PR CHANGELOG");
    }

    #[test]
    fn deserialize_negative_delay() {
        let error = parse_config("settle_delay_sec = -5").unwrap_err();
        assert!(error.to_string().contains("Duration must not be negative"));
    }

    #[test]
    fn deserialize_unknown_key() {
        assert!(parse_config("timeout = 5").is_err());
    }
}
