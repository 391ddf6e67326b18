use serde::{Deserialize, Serialize};

use super::overview::OverviewStats;
use crate::services::time_range::ResolvedRange;

// =========================================================
// Summary (day x hour) types
// =========================================================

/// One matrix cell: the concurrency of one hourly bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    /// Days since the window start (0-based).
    pub day_index: usize,
    /// Local hour of day (0-23).
    pub hour_index: u32,
    pub value: f64,
    pub start_timestamp_ms: i64,
    /// At least one violation was recorded in this bucket.
    pub violated: bool,
}

/// Output of the summary aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryAggregate {
    pub matrix: Vec<HeatCell>,
    pub overview: OverviewStats,
}

/// Column of the heat-map grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    pub position: usize,
    /// Localized hour-of-day label, e.g. `"5 AM"`.
    pub label: String,
}

/// Value rendered in one grid position.
///
/// Violations are carried in `violated` rather than in the sign of `value`,
/// so `value` is always the bucket's concurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub value: f64,
    pub violated: bool,
    pub start_timestamp_ms: i64,
    /// Route of the detail view for this bucket.
    pub detail_path: String,
}

impl GridCell {
    /// Value in the sign-encoded form expected by renderers that mark
    /// violations with a negative number.
    pub fn signed_value(&self) -> f64 {
        if self.violated {
            -self.value.abs()
        } else {
            self.value
        }
    }
}

/// One grid row, normally one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    pub date: String,
    pub start_timestamp_ms: i64,
    pub values: Vec<GridCell>,
}

/// Row/column projection of the heat map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<RowRecord>,
}

/// Everything the summary view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub range: ResolvedRange,
    pub overview: OverviewStats,
    pub grid: HeatmapGrid,
}

/// Route function name constant for the summary view
pub const GET_CONCURRENCY_SUMMARY: &str = "get_concurrency_summary";

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(value: f64, violated: bool) -> GridCell {
        GridCell {
            value,
            violated,
            start_timestamp_ms: 0,
            detail_path: String::new(),
        }
    }

    #[test]
    fn test_signed_value() {
        assert_eq!(cell(25.0, true).signed_value(), -25.0);
        assert_eq!(cell(25.0, false).signed_value(), 25.0);
        // Recovering the magnitude gives back the original value
        assert_eq!(cell(7.5, true).signed_value().abs(), 7.5);
    }

    #[test]
    fn test_const_value() {
        assert_eq!(GET_CONCURRENCY_SUMMARY, "get_concurrency_summary");
    }
}
