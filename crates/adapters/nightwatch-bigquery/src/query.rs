use chrono::{DateTime, Utc};
use serde::Serialize;

use nightwatch_core::window::ReportWindow;

/// True when `name` is safe to interpolate into the wildcard table path.
/// Everything else (backticks, dots, hyphens, whitespace) could escape the
/// quoted identifier.
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Build the top-errors aggregation query over `{prefix}YYYYMMDD` daily
/// export tables.
///
/// Identifiers must be pre-validated with [`is_safe_identifier`]; window
/// bounds and the `_TABLE_SUFFIX` range travel as named parameters.
///
/// Shape: per-day tables are pruned to the 48h scan range, `error_shown`
/// events are split into the current and previous 24h windows per
/// `(error_id, feature_name, context)`, then collapsed per `error_id` with
/// the most frequent context kept as representative (ties broken by context
/// text so the pick is deterministic).
pub fn top_errors_sql(project: &str, dataset: &str, table_prefix: &str) -> String {
    format!(
        r"WITH base AS (
  SELECT
    event_timestamp,
    (SELECT value.string_value FROM UNNEST(event_params) WHERE key = 'error_id') AS error_id,
    (SELECT value.string_value FROM UNNEST(event_params) WHERE key = 'feature_name') AS feature_name,
    (SELECT value.string_value FROM UNNEST(event_params) WHERE key = 'context') AS context
  FROM `{project}.{dataset}.{table_prefix}*`
  WHERE _TABLE_SUFFIX BETWEEN @suffix_start AND @suffix_end
    AND event_name = 'error_shown'
),
windowed AS (
  SELECT
    error_id,
    feature_name,
    context,
    COUNTIF(TIMESTAMP_MICROS(event_timestamp) >= @start_ts
        AND TIMESTAMP_MICROS(event_timestamp) < @end_ts) AS count_24h,
    COUNTIF(TIMESTAMP_MICROS(event_timestamp) >= @prev_start_ts
        AND TIMESTAMP_MICROS(event_timestamp) < @start_ts) AS count_prev_24h
  FROM base
  WHERE error_id IS NOT NULL
  GROUP BY error_id, feature_name, context
),
ranked AS (
  SELECT
    error_id,
    ANY_VALUE(feature_name) AS feature_name,
    ARRAY_AGG(STRUCT(context, count_24h)
        ORDER BY count_24h DESC, context LIMIT 1)[OFFSET(0)].context AS top_context,
    SUM(count_24h) AS count_24h,
    SUM(count_prev_24h) AS count_prev_24h
  FROM windowed
  GROUP BY error_id
)
SELECT
  error_id,
  feature_name,
  top_context,
  count_24h,
  (count_24h - count_prev_24h) AS delta
FROM ranked
ORDER BY count_24h DESC, error_id
LIMIT 3"
    )
}

/// One named parameter in a `jobs.query` request.
#[derive(Debug, Serialize)]
pub struct QueryParameter {
    name: &'static str,
    #[serde(rename = "parameterType")]
    parameter_type: ParameterType,
    #[serde(rename = "parameterValue")]
    parameter_value: ParameterValue,
}

#[derive(Debug, Serialize)]
struct ParameterType {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ParameterValue {
    value: String,
}

impl QueryParameter {
    fn timestamp(name: &'static str, value: DateTime<Utc>) -> Self {
        Self {
            name,
            parameter_type: ParameterType { kind: "TIMESTAMP" },
            parameter_value: ParameterValue {
                value: value.format("%Y-%m-%d %H:%M:%S%.6f+00").to_string(),
            },
        }
    }

    fn string(name: &'static str, value: String) -> Self {
        Self {
            name,
            parameter_type: ParameterType { kind: "STRING" },
            parameter_value: ParameterValue { value },
        }
    }
}

/// Named parameters binding the window bounds and partition-suffix range.
pub fn window_parameters(window: &ReportWindow) -> Vec<QueryParameter> {
    let (suffix_start, suffix_end) = window.suffix_range();
    vec![
        QueryParameter::timestamp("end_ts", window.end),
        QueryParameter::timestamp("start_ts", window.start),
        QueryParameter::timestamp("prev_start_ts", window.prev_start),
        QueryParameter::string("suffix_start", suffix_start),
        QueryParameter::string("suffix_end", suffix_end),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn safe_identifiers() {
        assert!(is_safe_identifier("events_"));
        assert!(is_safe_identifier("analytics_123456"));
        assert!(is_safe_identifier("my_project"));
    }

    #[test]
    fn unsafe_identifiers_rejected() {
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("data-set"));
        assert!(!is_safe_identifier("data.set"));
        assert!(!is_safe_identifier("data`set"));
        assert!(!is_safe_identifier("data set"));
        assert!(!is_safe_identifier("ds*"));
    }

    #[test]
    fn sql_scans_wildcard_table() {
        let sql = top_errors_sql("proj", "analytics", "events_");
        assert!(sql.contains("`proj.analytics.events_*`"));
    }

    #[test]
    fn sql_prunes_partitions_and_filters_event() {
        let sql = top_errors_sql("proj", "ds", "events_");
        assert!(sql.contains("_TABLE_SUFFIX BETWEEN @suffix_start AND @suffix_end"));
        assert!(sql.contains("event_name = 'error_shown'"));
        assert!(sql.contains("WHERE error_id IS NOT NULL"));
    }

    #[test]
    fn sql_tie_break_is_deterministic() {
        let sql = top_errors_sql("proj", "ds", "events_");
        assert!(sql.contains("ORDER BY count_24h DESC, context LIMIT 1"));
        assert!(sql.contains("ORDER BY count_24h DESC, error_id"));
        assert!(sql.contains("LIMIT 3"));
    }

    #[test]
    fn window_parameters_bind_bounds() {
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap();
        let window = ReportWindow::ending_at(end);
        let params = serde_json::to_value(window_parameters(&window)).unwrap();

        assert_eq!(params[0]["name"], "end_ts");
        assert_eq!(params[0]["parameterType"]["type"], "TIMESTAMP");
        assert_eq!(
            params[0]["parameterValue"]["value"],
            "2024-03-10 02:00:00.000000+00"
        );
        assert_eq!(
            params[1]["parameterValue"]["value"],
            "2024-03-09 02:00:00.000000+00"
        );
        assert_eq!(
            params[2]["parameterValue"]["value"],
            "2024-03-08 02:00:00.000000+00"
        );
        assert_eq!(params[3]["parameterType"]["type"], "STRING");
        assert_eq!(params[3]["parameterValue"]["value"], "20240308");
        assert_eq!(params[4]["parameterValue"]["value"], "20240310");
    }
}
