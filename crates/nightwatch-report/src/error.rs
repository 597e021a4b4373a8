use nightwatch_bigquery::QueryError;
use nightwatch_github::IssueError;

use crate::config::ConfigError;

/// Top-level failure of a report run. Every variant is fatal; the process
/// exits non-zero without retrying.
#[derive(Debug)]
pub enum ReportError {
    Config(ConfigError),
    Query(QueryError),
    Issue(IssueError),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Query(e) => write!(f, "{e}"),
            Self::Issue(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Query(e) => Some(e),
            Self::Issue(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ReportError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<QueryError> for ReportError {
    fn from(e: QueryError) -> Self {
        Self::Query(e)
    }
}

impl From<IssueError> for ReportError {
    fn from(e: IssueError) -> Self {
        Self::Issue(e)
    }
}
