//! # Concurrency Insights
//!
//! Analytics pipeline for concurrent-request utilization of an account.
//!
//! Raw samples reported by an external capacity-monitoring service are turned
//! into three linked views:
//!
//! - **Summary**: a day x hour heat map over 1 to 29 days, with overview
//!   statistics (peak, time close to and over the limit, violation rate,
//!   top integrations)
//! - **Detail**: per-minute rows for one hour of the summary
//! - **Request**: the requests in flight during one minute of the detail
//!
//! Each view links to the next through exact millisecond coordinates
//! carried in route paths.
//!
//! ## Architecture
//!
//! - [`api`]: Public DTO surface and the [`api::AccountId`] newtype
//! - [`models`]: Time handling and series types
//! - [`routes`]: Serializable view types
//! - [`services`]: Time range resolution, aggregation, drill-down links and view state
//! - [`gateway`]: Access to the capacity-monitoring service
//! - [`config`]: `insights.toml` and environment overrides
//! - [`http`]: Axum-based HTTP server (feature `http-server`)

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
