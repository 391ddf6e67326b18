use serde::{Deserialize, Serialize};

// =========================================================
// Request listing types
// =========================================================

/// A request record shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDisplayRow {
    pub start_time: String,
    pub end_time: String,
    pub script_type: String,
    pub integration: String,
    pub operation: String,
    pub script_name: String,
    pub status: String,
}

/// Peak of the minute the operator drilled into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakMarker {
    pub value: f64,
    pub time_ms: i64,
    pub time: String,
}

/// Everything the request view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestView {
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<PeakMarker>,
    pub rows: Vec<RequestDisplayRow>,
}

/// Route function name constant for the request view
pub const GET_CONCURRENCY_REQUESTS: &str = "get_concurrency_requests";
