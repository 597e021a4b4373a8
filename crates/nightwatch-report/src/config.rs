//! Environment-driven configuration for the nightly report run.
//!
//! Loaded once per invocation; required keys abort the run before any
//! external call is made.

pub const GCP_PROJECT_ID: &str = "GCP_PROJECT_ID";
pub const GCP_ACCESS_TOKEN: &str = "GCP_ACCESS_TOKEN";
pub const BQ_DATASET: &str = "BQ_DATASET";
pub const BQ_TABLE_PREFIX: &str = "BQ_TABLE_PREFIX";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_OWNER: &str = "GITHUB_OWNER";
pub const GITHUB_REPO: &str = "GITHUB_REPO";
pub const NIGHTLY_ISSUE_NUMBER: &str = "NIGHTLY_ISSUE_NUMBER";

// Single-tenant deployment defaults.
pub const DEFAULT_TABLE_PREFIX: &str = "events_";
pub const DEFAULT_GITHUB_OWNER: &str = "AndrewAltimit";
pub const DEFAULT_GITHUB_REPO: &str = "nightwatch";
pub const DEFAULT_ISSUE_NUMBER: &str = "2";

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub project_id: String,
    pub dataset: String,
    pub table_prefix: String,
    pub gcp_access_token: String,
    pub github_token: String,
    pub github_owner: String,
    pub github_repo: String,
    pub issue_number: u64,
}

#[derive(Debug)]
pub enum ConfigError {
    /// Required key unset or whitespace-only.
    Missing(String),
    /// Key present but not parseable as an integer.
    InvalidNumber { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "Missing required env: {key}"),
            Self::InvalidNumber { key, value } => {
                write!(f, "Env {key} is not a number: {value:?}")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

impl ReportConfig {
    /// Resolve the full configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: require(GCP_PROJECT_ID)?,
            dataset: require(BQ_DATASET)?,
            table_prefix: optional(BQ_TABLE_PREFIX, DEFAULT_TABLE_PREFIX),
            gcp_access_token: require(GCP_ACCESS_TOKEN)?,
            github_token: require(GITHUB_TOKEN)?,
            github_owner: optional(GITHUB_OWNER, DEFAULT_GITHUB_OWNER),
            github_repo: optional(GITHUB_REPO, DEFAULT_GITHUB_REPO),
            issue_number: parse_issue_number(
                NIGHTLY_ISSUE_NUMBER,
                &optional(NIGHTLY_ISSUE_NUMBER, DEFAULT_ISSUE_NUMBER),
            )?,
        })
    }
}

/// The environment value for `key`; an error if unset or whitespace-only.
pub fn require(key: &str) -> Result<String, ConfigError> {
    required_value(key, std::env::var(key).ok())
}

/// The environment value for `key`, or `default` if unset or
/// whitespace-only.
pub fn optional(key: &str, default: &str) -> String {
    fallback_value(std::env::var(key).ok(), default)
}

fn required_value(key: &str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

fn fallback_value(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

fn parse_issue_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
