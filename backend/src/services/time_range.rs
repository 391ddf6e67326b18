//! Resolution of operator criteria into absolute, aligned windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{TimestampFormatter, ViewKind, DAY_MS};

/// Day counts offered by the summary criteria form.
pub const SUMMARY_DAY_OPTIONS: [i64; 6] = [1, 2, 3, 7, 14, 29];

/// Default summary lookback.
pub const DEFAULT_SUMMARY_DAYS: i64 = 7;

/// The window an operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangeSelection {
    /// The last `n` calendar days, ending at the next local midnight.
    RelativeDays(i64),
    /// Boundaries carried by a drill-down link.
    ExplicitRange { start_ms: i64, end_ms: i64 },
}

impl TimeRangeSelection {
    /// Selection for the summary criteria form, restricted to the offered day counts.
    pub fn summary_days(days: i64) -> AnalyticsResult<Self> {
        if SUMMARY_DAY_OPTIONS.contains(&days) {
            Ok(TimeRangeSelection::RelativeDays(days))
        } else {
            Err(AnalyticsError::InvalidSelection(format!(
                "day count {} is not one of {:?}",
                days, SUMMARY_DAY_OPTIONS
            )))
        }
    }
}

/// Absolute window boundaries for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start_ms: i64,
    pub end_ms: i64,
    /// Bucket width of the view; `None` for the request listing.
    pub bucket_width_ms: Option<i64>,
    /// Start of the violation lookback. Earlier than `start_ms` for relative
    /// summary windows so that boundary buckets see every violation.
    pub violation_start_ms: i64,
}

/// Turns a [`TimeRangeSelection`] into a [`ResolvedRange`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRangeResolver {
    formatter: TimestampFormatter,
}

impl TimeRangeResolver {
    pub fn new(formatter: TimestampFormatter) -> Self {
        Self { formatter }
    }

    /// Resolve relative to the current time.
    pub fn resolve(
        &self,
        selection: &TimeRangeSelection,
        view: ViewKind,
    ) -> AnalyticsResult<ResolvedRange> {
        self.resolve_at(selection, view, Utc::now())
    }

    /// Resolve relative to `now`.
    pub fn resolve_at(
        &self,
        selection: &TimeRangeSelection,
        view: ViewKind,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<ResolvedRange> {
        let bucket_width_ms = view.bucket_width_ms();

        match *selection {
            TimeRangeSelection::RelativeDays(days) => {
                if days <= 0 {
                    return Err(AnalyticsError::InvalidSelection(format!(
                        "day count must be positive, got {}",
                        days
                    )));
                }
                let end_ms = self.formatter.next_local_midnight(now).ok_or_else(|| {
                    AnalyticsError::InvalidSelection(format!("cannot place {} on the calendar", now))
                })?;
                let start_ms = days
                    .checked_mul(DAY_MS)
                    .and_then(|span| end_ms.checked_sub(span))
                    .ok_or_else(|| {
                        AnalyticsError::InvalidSelection(format!("day count {} is too large", days))
                    })?;
                let violation_start_ms = if view == ViewKind::Summary {
                    start_ms - DAY_MS
                } else {
                    start_ms
                };
                Ok(ResolvedRange {
                    start_ms,
                    end_ms,
                    bucket_width_ms,
                    violation_start_ms,
                })
            }
            TimeRangeSelection::ExplicitRange { start_ms, end_ms } => {
                if start_ms >= end_ms {
                    return Err(AnalyticsError::InvalidSelection(format!(
                        "start {} must be before end {}",
                        start_ms, end_ms
                    )));
                }
                Ok(ResolvedRange {
                    start_ms,
                    end_ms,
                    bucket_width_ms,
                    violation_start_ms: start_ms,
                })
            }
        }
    }
}
