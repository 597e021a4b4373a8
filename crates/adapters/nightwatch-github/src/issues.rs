use serde::Deserialize;

const API_ROOT: &str = "https://api.github.com";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Client for reading and rewriting one tracking issue. Single attempt per
/// call; failures propagate to the caller.
pub struct IssueClient {
    http: reqwest::Client,
    token: String,
}

/// Partial GitHub issue response — only the body matters here.
#[derive(Debug, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug)]
pub enum IssueError {
    /// Transport-level failure.
    Http(reqwest::Error),
    /// Non-2xx response reading the issue.
    Fetch { status: reqwest::StatusCode },
    /// Non-2xx response writing the issue body.
    Update { status: reqwest::StatusCode },
}

impl std::fmt::Display for IssueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "GitHub request failed: {e}"),
            Self::Fetch { status } => write!(f, "GitHub issue fetch returned {status}"),
            Self::Update { status } => write!(f, "GitHub issue update returned {status}"),
        }
    }
}

impl std::error::Error for IssueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IssueError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl IssueClient {
    pub fn new(token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("nightwatch-report/0.1")
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            token: token.into(),
        }
    }

    /// Read the current issue, including a possibly-null body.
    pub async fn fetch_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Issue, IssueError> {
        let url = issue_url(owner, repo, number);
        tracing::debug!(owner, repo, number, "Fetching tracking issue");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IssueError::Fetch {
                status: resp.status(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Replace the issue body wholesale.
    pub async fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), IssueError> {
        let url = issue_url(owner, repo, number);
        tracing::debug!(owner, repo, number, "Updating tracking issue");

        let resp = self
            .http
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IssueError::Update {
                status: resp.status(),
            });
        }
        Ok(())
    }
}

fn issue_url(owner: &str, repo: &str, number: u64) -> String {
    format!("{API_ROOT}/repos/{owner}/{repo}/issues/{number}")
}
