use serde::{Deserialize, Serialize};

use nightwatch_core::report::ErrorAggregateRow;
use nightwatch_core::window::ReportWindow;

use crate::query::{QueryParameter, is_safe_identifier, top_errors_sql, window_parameters};

const QUERY_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2/projects";

/// Minimal synchronous-call BigQuery client over the `jobs.query` REST
/// endpoint. One query per run; no job polling, no retries.
pub struct BigQueryClient {
    http: reqwest::Client,
    project_id: String,
    access_token: String,
}

#[derive(Debug)]
pub enum QueryError {
    /// Project, dataset, or table prefix failed identifier validation.
    InvalidIdentifier(String),
    /// Transport-level failure.
    Http(reqwest::Error),
    /// Non-2xx response from the query endpoint.
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The query did not finish within the endpoint's synchronous wait.
    Incomplete,
    /// Response rows did not match the expected result shape.
    Decode(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(name) => write!(f, "unsafe query identifier: {name:?}"),
            Self::Http(e) => write!(f, "BigQuery request failed: {e}"),
            Self::Api { status, body } => write!(f, "BigQuery API returned {status}: {body}"),
            Self::Incomplete => write!(f, "BigQuery job did not complete synchronously"),
            Self::Decode(msg) => write!(f, "Malformed BigQuery response: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

/// `jobs.query` request body.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "useLegacySql")]
    use_legacy_sql: bool,
    #[serde(rename = "parameterMode")]
    parameter_mode: &'a str,
    #[serde(rename = "queryParameters")]
    query_parameters: Vec<QueryParameter>,
}

/// Partial `jobs.query` response: completion flag and the row data.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "jobComplete", default)]
    job_complete: bool,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

/// One cell; BigQuery encodes INT64 values as JSON strings.
#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: serde_json::Value,
}

impl BigQueryClient {
    /// Build a client for one project. No request timeout — the warehouse
    /// call relies on the transport defaults.
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("nightwatch-report/0.1")
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            project_id: project_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Run the top-errors aggregation for the given window and return at most
    /// three ranked rows.
    pub async fn top_errors(
        &self,
        dataset: &str,
        table_prefix: &str,
        window: &ReportWindow,
    ) -> Result<Vec<ErrorAggregateRow>, QueryError> {
        for name in [self.project_id.as_str(), dataset, table_prefix] {
            if !is_safe_identifier(name) {
                return Err(QueryError::InvalidIdentifier(name.to_string()));
            }
        }

        let sql = top_errors_sql(&self.project_id, dataset, table_prefix);
        let url = format!("{QUERY_ENDPOINT}/{}/queries", self.project_id);

        tracing::debug!(dataset, table_prefix, "Running top-errors query");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&QueryRequest {
                query: &sql,
                use_legacy_sql: false,
                parameter_mode: "NAMED",
                query_parameters: window_parameters(window),
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Api { status, body });
        }

        let parsed: QueryResponse = resp.json().await?;
        rows_from_response(parsed)
    }
}

fn rows_from_response(resp: QueryResponse) -> Result<Vec<ErrorAggregateRow>, QueryError> {
    if !resp.job_complete {
        return Err(QueryError::Incomplete);
    }
    resp.rows.iter().map(decode_row).collect()
}

/// Cells arrive positionally: error_id, feature_name, top_context,
/// count_24h, delta.
fn decode_row(row: &TableRow) -> Result<ErrorAggregateRow, QueryError> {
    if row.f.len() != 5 {
        return Err(QueryError::Decode(format!(
            "expected 5 cells per row, got {}",
            row.f.len()
        )));
    }
    Ok(ErrorAggregateRow {
        error_id: cell_str(&row.f[0]),
        feature_name: cell_str(&row.f[1]),
        top_context: cell_str(&row.f[2]),
        count_24h: cell_i64(&row.f[3])?,
        delta: cell_i64(&row.f[4])?,
    })
}

fn cell_str(cell: &TableCell) -> Option<String> {
    cell.v.as_str().map(String::from)
}

fn cell_i64(cell: &TableCell) -> Result<i64, QueryError> {
    match &cell.v {
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| QueryError::Decode(format!("non-integer count cell: {s:?}"))),
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| QueryError::Decode(format!("non-integer count cell: {n}"))),
        other => Err(QueryError::Decode(format!(
            "unexpected count cell: {other}"
        ))),
    }
}
