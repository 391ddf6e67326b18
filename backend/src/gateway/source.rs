//! Gateway trait for the external capacity-monitoring service.

use async_trait::async_trait;

use super::error::GatewayResult;
use crate::api::AccountId;
use crate::models::{ConcurrencyFeed, RequestRecord, ViolationFeed};

/// Read access to raw utilization data.
///
/// All calls are idempotent reads over `[start_ms, end_ms)`. Implementations
/// own their transport, pagination and timeout policy; callers only see the
/// assembled result.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ConcurrencyGateway: Send + Sync {
    /// Fetch concurrency samples and the account's concurrency limit.
    async fn fetch_concurrency(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<ConcurrencyFeed>;

    /// Fetch violation counts together with request and violation totals.
    async fn fetch_violations(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<ViolationFeed>;

    /// Fetch the requests active in the window, ordered by start time.
    async fn fetch_requests(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<Vec<RequestRecord>>;

    /// Check whether the service is reachable.
    async fn health_check(&self) -> GatewayResult<bool>;
}
