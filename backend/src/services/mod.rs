//! Service layer: time resolution, aggregation and view orchestration.
//!
//! Aggregators are pure functions of the fetched series. The pipeline
//! ties them to the gateway, and the view state applies results with
//! last-request-wins semantics.

pub mod detail;
pub mod drilldown;
pub mod heatmap;
pub mod overview;
pub mod pipeline;
pub mod requests;
pub mod summary;
pub mod time_range;
pub mod view_state;

pub use detail::DetailAggregator;
pub use drilldown::{DetailLink, DrillDownLinker, PeakCoordinate, RequestLink};
pub use heatmap::{chunk_rows, HeatmapMatrixBuilder, DEFAULT_ROW_SPAN};
pub use overview::{LimitBand, OverviewCalculator};
pub use pipeline::InsightsPipeline;
pub use requests::RequestProjector;
pub use summary::SummaryAggregator;
pub use time_range::{ResolvedRange, TimeRangeResolver, TimeRangeSelection};
pub use view_state::{ViewCache, ViewKey, ViewRegistry, ViewSnapshot, ViewState};
