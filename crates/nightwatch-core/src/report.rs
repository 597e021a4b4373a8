use serde::{Deserialize, Serialize};

/// Maximum number of ranked entries in a report section.
pub const MAX_REPORT_ROWS: usize = 3;

/// One ranked error aggregate from the current 24h window.
///
/// Rows arrive ordered by `count_24h` descending, at most
/// [`MAX_REPORT_ROWS`] of them per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorAggregateRow {
    /// Error identifier; absent values render as `UNKNOWN`.
    #[serde(default)]
    pub error_id: Option<String>,
    #[serde(default)]
    pub feature_name: Option<String>,
    /// Most frequent contextual tag for this error in the current window.
    #[serde(default)]
    pub top_context: Option<String>,
    pub count_24h: i64,
    /// `count_24h - count_prev_24h`, signed.
    pub delta: i64,
}

/// The heading that keys a section inside the issue body.
pub fn section_heading(date_label: &str) -> String {
    format!("## {date_label}")
}

/// Whether the issue body already carries a section for the given date.
/// Plain substring match — duplicate-append protection, not parsing.
pub fn has_section(body: &str, date_label: &str) -> bool {
    body.contains(&section_heading(date_label))
}

/// Delta with the report's sign convention: non-negative values get a
/// leading `+`, negative values keep their native minus sign.
pub fn format_delta(delta: i64) -> String {
    if delta >= 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

/// Render one dated Markdown section from the ranked rows.
///
/// Pure string assembly; appending to the issue body is the caller's job.
pub fn render_section(date_label: &str, rows: &[ErrorAggregateRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", section_heading(date_label)));
    out.push_str("\n### Top 3 errors (last 24h)\n");

    if rows.is_empty() {
        out.push_str("- No `error_shown` events found in last 24h.\n");
        out.push_str("\n---\n");
        return out;
    }

    for (idx, row) in rows.iter().enumerate() {
        let error_id = row.error_id.as_deref().unwrap_or("UNKNOWN");
        let feature = row.feature_name.as_deref().unwrap_or("Unknown");
        let context = row.top_context.as_deref().unwrap_or("Unknown");

        out.push_str(&format!("{}) **[{error_id}]**\n", idx + 1));
        out.push_str(&format!(
            "   - Count / Trend: `x{}` (vs yesterday `{}`)\n",
            row.count_24h,
            format_delta(row.delta)
        ));
        out.push_str(&format!("   - Feature: `{feature}`\n"));
        out.push_str(&format!("   - Context: `{context}`\n"));
        out.push_str("   - Suggested labels: `area:*`, `prio:p*`, `status:*`\n");
        out.push_str("   - Linked issue: \n\n");
    }

    out.push_str("\n---\n");
    out.push_str("\n### Suggested next actions (pick 1)\n");
    out.push_str("- [ ] Create or update an issue for the top entry and label it `go:fix`.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        error_id: Option<&str>,
        feature: Option<&str>,
        context: Option<&str>,
        count_24h: i64,
        delta: i64,
    ) -> ErrorAggregateRow {
        ErrorAggregateRow {
            error_id: error_id.map(String::from),
            feature_name: feature.map(String::from),
            top_context: context.map(String::from),
            count_24h,
            delta,
        }
    }

    #[test]
    fn full_row_renders_all_fields() {
        let rows = vec![row(Some("E1"), Some("Login"), Some("retry"), 12, 5)];
        let md = render_section("2026-08-07", &rows);
        assert!(md.contains("## 2026-08-07"));
        assert!(md.contains("**[E1]**"));
        assert!(md.contains("`x12`"));
        assert!(md.contains("(vs yesterday `+5`)"));
        assert!(md.contains("`Login`"));
        assert!(md.contains("`retry`"));
    }

    #[test]
    fn empty_rows_render_no_data_line() {
        let md = render_section("2026-08-07", &[]);
        assert!(md.contains("No `error_shown` events found in last 24h."));
        assert!(!md.contains(") **["));
        // The next-actions checklist only appears when there are entries.
        assert!(!md.contains("Suggested next actions"));
        assert!(md.contains("\n---\n"));
    }

    #[test]
    fn negative_delta_keeps_native_sign() {
        let rows = vec![row(Some("E2"), None, None, 4, -3)];
        let md = render_section("2026-08-07", &rows);
        assert!(md.contains("(vs yesterday `-3`)"));
        assert!(!md.contains("`+-3`"));
    }

    #[test]
    fn zero_delta_gets_plus_sign() {
        assert_eq!(format_delta(0), "+0");
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let rows = vec![row(None, None, None, 1, 0)];
        let md = render_section("2026-08-07", &rows);
        assert!(md.contains("**[UNKNOWN]**"));
        assert!(md.contains("- Feature: `Unknown`"));
        assert!(md.contains("- Context: `Unknown`"));
    }

    #[test]
    fn three_rows_render_three_numbered_entries() {
        let rows = vec![
            row(Some("E1"), Some("A"), Some("a"), 30, 1),
            row(Some("E2"), Some("B"), Some("b"), 20, -2),
            row(Some("E3"), Some("C"), Some("c"), 10, 0),
        ];
        let md = render_section("2026-08-07", &rows);
        assert!(md.contains("1) **[E1]**"));
        assert!(md.contains("2) **[E2]**"));
        assert!(md.contains("3) **[E3]**"));
        assert_eq!(md.matches(") **[").count(), 3);
        assert!(md.contains("Suggested next actions"));
    }

    #[test]
    fn rendered_section_has_static_placeholders() {
        let rows = vec![row(Some("E1"), None, None, 1, 1)];
        let md = render_section("2026-08-07", &rows);
        assert!(md.contains("- Suggested labels: `area:*`, `prio:p*`, `status:*`"));
        assert!(md.contains("- Linked issue: "));
    }

    #[test]
    fn has_section_matches_date_heading() {
        let body = "intro\n\n## 2026-08-06\n\nolder content\n";
        assert!(has_section(body, "2026-08-06"));
        assert!(!has_section(body, "2026-08-07"));
    }

    #[test]
    fn has_section_on_empty_body() {
        assert!(!has_section("", "2026-08-07"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn delta_plus_prefix_iff_non_negative(delta in proptest::num::i64::ANY) {
                let s = format_delta(delta);
                if delta >= 0 {
                    prop_assert!(s.starts_with('+'));
                    prop_assert_eq!(s[1..].parse::<i64>().unwrap(), delta);
                } else {
                    prop_assert!(s.starts_with('-'));
                    prop_assert_eq!(s.parse::<i64>().unwrap(), delta);
                }
            }

            #[test]
            fn entry_count_matches_row_count(n in 0usize..=MAX_REPORT_ROWS) {
                let rows: Vec<ErrorAggregateRow> = (0..n)
                    .map(|i| row(Some(&format!("E{i}")), None, None, i as i64, 0))
                    .collect();
                let md = render_section("2026-01-01", &rows);
                prop_assert_eq!(md.matches(") **[").count(), n);
                let no_data = md.contains("No `error_shown` events found");
                prop_assert_eq!(no_data, n == 0);
            }
        }
    }
}
