use serde::{Deserialize, Serialize};

/// One in-flight request reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub script_type: String,
    pub integration: String,
    pub operation: String,
    pub script_name: String,
    pub status: String,
}
