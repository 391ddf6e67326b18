//! Public API surface for the analytics backend.
//!
//! This file consolidates the DTO types returned by the three views.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::ConcurrencyFeed;
pub use crate::models::ConcurrencyPoint;
pub use crate::models::IntegrationUsage;
pub use crate::models::RequestRecord;
pub use crate::models::ViolationFeed;
pub use crate::models::ViolationIndex;
pub use crate::models::ViolationOverview;
pub use crate::routes::detail::DetailConfig;
pub use crate::routes::detail::DetailData;
pub use crate::routes::detail::DetailResultRow;
pub use crate::routes::detail::DetailView;
pub use crate::routes::detail::LinkedDetailRow;
pub use crate::routes::overview::OverviewStats;
pub use crate::routes::overview::PeakConcurrency;
pub use crate::routes::overview::PercentCloseToLimit;
pub use crate::routes::overview::PercentOverLimit;
pub use crate::routes::overview::RateValue;
pub use crate::routes::overview::TopIntegration;
pub use crate::routes::request::PeakMarker;
pub use crate::routes::request::RequestDisplayRow;
pub use crate::routes::request::RequestView;
pub use crate::routes::summary::ColumnDef;
pub use crate::routes::summary::GridCell;
pub use crate::routes::summary::HeatCell;
pub use crate::routes::summary::HeatmapGrid;
pub use crate::routes::summary::RowRecord;
pub use crate::routes::summary::SummaryAggregate;
pub use crate::routes::summary::SummaryView;
pub use crate::services::time_range::ResolvedRange;

use serde::{Deserialize, Serialize};

/// Identifier of the account whose capacity is being inspected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> Self {
        AccountId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
