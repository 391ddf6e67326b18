use serde::{Deserialize, Serialize};

// =========================================================
// Overview statistics shared by the summary and detail views
// =========================================================

/// Highest concurrency in a window and when it was first reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakConcurrency {
    pub value: f64,
    pub timestamp_ms: i64,
}

/// Share of buckets inside the close-to-limit band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentCloseToLimit {
    /// Percentage rounded to two decimals, e.g. `"2.08"`.
    pub value: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Share of buckets at or above the limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentOverLimit {
    pub value: String,
    pub bound: f64,
}

/// A percentage that may be undefined because its denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateValue {
    Percent(String),
    NotApplicable,
}

impl std::fmt::Display for RateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateValue::Percent(value) => write!(f, "{}%", value),
            RateValue::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// An integration ranked by unallocated request volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopIntegration {
    pub name: String,
    pub request_count: u64,
}

/// Scalar summary of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub concurrency_limit: f64,
    pub peak_concurrency: PeakConcurrency,
    pub percent_close_to_limit: PercentCloseToLimit,
    pub percent_over_limit: PercentOverLimit,
    pub total_requests: u64,
    pub total_violations: u64,
    pub violation_rate: RateValue,
    pub top_integrations: Vec<TopIntegration>,
}
