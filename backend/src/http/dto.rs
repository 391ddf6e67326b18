//! Data Transfer Objects for the HTTP API.
//!
//! View payloads are the route types themselves, wrapped in a
//! [`ViewSnapshot`]; only the request-side shapes live here.

use serde::{Deserialize, Serialize};

pub use crate::api::{DetailView, RequestView, SummaryView};
pub use crate::services::view_state::ViewSnapshot;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Reachability of the capacity-monitoring service
    pub gateway: String,
}

/// Query parameters of the summary endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryQuery {
    /// Lookback in days; one of 1, 2, 3, 7, 14 or 29
    pub days: Option<i64>,
}
