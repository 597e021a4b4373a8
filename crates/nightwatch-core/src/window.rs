use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Fixed offset for the report date label (UTC+9), independent of the host
/// machine timezone.
pub const REPORT_UTC_OFFSET_HOURS: i32 = 9;

/// Rolling 24h reporting window plus the adjacent 24h comparison window.
///
/// All three instants are UTC; partition filtering derives calendar dates
/// from them (see [`ReportWindow::suffix_range`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// Window end, anchored to "now" at query time.
    pub end: DateTime<Utc>,
    /// `end - 24h`; events in `[start, end)` count toward the current window.
    pub start: DateTime<Utc>,
    /// `end - 48h`; events in `[prev_start, start)` count toward the
    /// comparison window.
    pub prev_start: DateTime<Utc>,
}

impl ReportWindow {
    /// Window anchored to the current instant.
    pub fn now() -> Self {
        Self::ending_at(Utc::now())
    }

    /// Window ending at the given instant.
    pub fn ending_at(end: DateTime<Utc>) -> Self {
        Self {
            end,
            start: end - Duration::hours(24),
            prev_start: end - Duration::hours(48),
        }
    }

    /// Inclusive `_TABLE_SUFFIX` bounds (`YYYYMMDD`, UTC calendar dates)
    /// covering the full 48h scan range. Partition pruning only — the
    /// timestamp predicates do the precise windowing.
    pub fn suffix_range(&self) -> (String, String) {
        (
            self.prev_start.format("%Y%m%d").to_string(),
            self.end.format("%Y%m%d").to_string(),
        )
    }
}

/// Date label (`YYYY-MM-DD`) for the report heading, in the fixed report
/// timezone.
pub fn today_label(now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(REPORT_UTC_OFFSET_HOURS * 3600).expect("valid UTC offset");
    now.with_timezone(&offset).format("%Y-%m-%d").to_string()
}
