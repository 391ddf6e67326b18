use serde::{Deserialize, Serialize};

use super::overview::OverviewStats;

// =========================================================
// Detail (per-minute) types
// =========================================================

/// One per-minute bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResultRow {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub average_concurrency: f64,
    pub peak_concurrency: f64,
    /// Timestamp of the peak sample; absent when the minute had no concurrency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_concurrency_timestamp: Option<String>,
}

/// Presentation settings of the detail table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailConfig {
    pub start_ms: i64,
    pub end_ms: i64,
    pub bucket_width_ms: i64,
    pub concurrency_limit: f64,
    pub utc_offset_minutes: i32,
}

/// Output of the detail aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailData {
    pub overview: OverviewStats,
    pub config: DetailConfig,
    pub rows: Vec<DetailResultRow>,
}

/// A detail row with the route of its request view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedDetailRow {
    #[serde(flatten)]
    pub row: DetailResultRow,
    pub request_path: String,
}

/// Everything the detail view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailView {
    pub overview: OverviewStats,
    pub config: DetailConfig,
    pub rows: Vec<LinkedDetailRow>,
}

/// Route function name constant for the detail view
pub const GET_CONCURRENCY_DETAIL: &str = "get_concurrency_detail";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_without_peak_omits_timestamp() {
        let row = DetailResultRow {
            start_time_ms: 0,
            end_time_ms: 60_000,
            average_concurrency: 0.0,
            peak_concurrency: 0.0,
            peak_concurrency_timestamp: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("peak_concurrency_timestamp").is_none());
    }

    #[test]
    fn test_linked_row_is_flat() {
        let linked = LinkedDetailRow {
            row: DetailResultRow {
                start_time_ms: 0,
                end_time_ms: 60_000,
                average_concurrency: 1.5,
                peak_concurrency: 2.0,
                peak_concurrency_timestamp: Some("1970-01-01 00:00:10.000 +00:00".to_string()),
            },
            request_path: "/concurrencyRequest/0/60000/2/10000".to_string(),
        };
        let json = serde_json::to_value(&linked).unwrap();
        assert_eq!(json["peak_concurrency"], 2.0);
        assert_eq!(json["request_path"], "/concurrencyRequest/0/60000/2/10000");
    }
}
