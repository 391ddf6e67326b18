//! In-memory local gateway implementation.
//!
//! This module provides a local implementation of [`ConcurrencyGateway`]
//! suitable for unit testing and local development. All data is stored in
//! memory, providing fast, deterministic, and isolated execution.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::error::{GatewayError, GatewayResult};
use super::source::ConcurrencyGateway;
use crate::api::AccountId;
use crate::models::{
    ConcurrencyFeed, ConcurrencyOverview, ConcurrencyPoint, IntegrationUsage, RequestRecord,
    ViolationFeed, ViolationIndex, ViolationOverview,
};

/// In-memory local gateway.
///
/// # Example
/// ```
/// use concurrency_insights::api::{AccountId, ConcurrencyPoint};
/// use concurrency_insights::gateway::LocalGateway;
///
/// let gateway = LocalGateway::new();
/// let account = AccountId::new("acct");
/// gateway.seed_account(&account, 20.0);
/// gateway.add_samples(&account, vec![ConcurrencyPoint::new(0, 4.0)]);
/// ```
#[derive(Clone)]
pub struct LocalGateway {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct LocalData {
    accounts: HashMap<AccountId, AccountData>,
    is_healthy: bool,
    failure: Option<String>,
}

#[derive(Default)]
struct AccountData {
    concurrency_limit: f64,
    samples: Vec<ConcurrencyPoint>,
    violations: Vec<(i64, u64)>,
    request_volume: Vec<(i64, u64)>,
    integration_usage: Vec<(i64, String, u64)>,
    requests: Vec<RequestRecord>,
}

impl LocalGateway {
    /// Create a new empty local gateway.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                is_healthy: true,
                ..Default::default()
            })),
        }
    }

    /// Register an account with its concurrency limit. Existing data is kept.
    pub fn seed_account(&self, account: &AccountId, concurrency_limit: f64) {
        let mut data = self.data.write();
        data.accounts
            .entry(account.clone())
            .or_default()
            .concurrency_limit = concurrency_limit;
    }

    /// Append concurrency samples. Order is preserved as given.
    pub fn add_samples(&self, account: &AccountId, samples: Vec<ConcurrencyPoint>) {
        let mut data = self.data.write();
        data.accounts
            .entry(account.clone())
            .or_default()
            .samples
            .extend(samples);
    }

    /// Record `count` violations at `timestamp_ms`.
    pub fn add_violation(&self, account: &AccountId, timestamp_ms: i64, count: u64) {
        let mut data = self.data.write();
        data.accounts
            .entry(account.clone())
            .or_default()
            .violations
            .push((timestamp_ms, count));
    }

    /// Record `count` requests handled at `timestamp_ms`.
    pub fn add_request_volume(&self, account: &AccountId, timestamp_ms: i64, count: u64) {
        let mut data = self.data.write();
        data.accounts
            .entry(account.clone())
            .or_default()
            .request_volume
            .push((timestamp_ms, count));
    }

    /// Record unallocated requests made by an integration at `timestamp_ms`.
    pub fn add_integration_usage(
        &self,
        account: &AccountId,
        timestamp_ms: i64,
        integration: impl Into<String>,
        count: u64,
    ) {
        let mut data = self.data.write();
        data.accounts
            .entry(account.clone())
            .or_default()
            .integration_usage
            .push((timestamp_ms, integration.into(), count));
    }

    /// Add a request record.
    pub fn add_request(&self, account: &AccountId, record: RequestRecord) {
        let mut data = self.data.write();
        data.accounts
            .entry(account.clone())
            .or_default()
            .requests
            .push(record);
    }

    /// Set the value reported by [`ConcurrencyGateway::health_check`].
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make every fetch fail with a connection error until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        self.data.write().failure = message.map(str::to_string);
    }

    fn with_account<T>(
        &self,
        account: &AccountId,
        f: impl FnOnce(&AccountData) -> T,
    ) -> GatewayResult<T> {
        let data = self.data.read();
        if let Some(message) = &data.failure {
            return Err(GatewayError::ConnectionError(message.clone()));
        }
        data.accounts
            .get(account)
            .map(f)
            .ok_or_else(|| GatewayError::NotFound(format!("Account {} not found", account)))
    }
}

impl Default for LocalGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn in_window(ts: i64, start_ms: i64, end_ms: i64) -> bool {
    ts >= start_ms && ts < end_ms
}

#[async_trait]
impl ConcurrencyGateway for LocalGateway {
    async fn fetch_concurrency(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<ConcurrencyFeed> {
        self.with_account(account, |acct| ConcurrencyFeed {
            points: acct
                .samples
                .iter()
                .filter(|p| in_window(p.timestamp_ms, start_ms, end_ms))
                .copied()
                .collect(),
            overview: ConcurrencyOverview {
                concurrency_limit: acct.concurrency_limit,
            },
        })
    }

    async fn fetch_violations(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<ViolationFeed> {
        self.with_account(account, |acct| {
            // The violation feed reports the closing boundary inclusively.
            let index: ViolationIndex = acct
                .violations
                .iter()
                .filter(|(ts, _)| *ts >= start_ms && *ts <= end_ms)
                .copied()
                .collect();

            let total_requests = acct
                .request_volume
                .iter()
                .filter(|(ts, _)| in_window(*ts, start_ms, end_ms))
                .map(|(_, c)| *c)
                .sum();

            let mut by_integration: BTreeMap<&str, u64> = BTreeMap::new();
            for (ts, name, count) in &acct.integration_usage {
                if in_window(*ts, start_ms, end_ms) {
                    *by_integration.entry(name.as_str()).or_insert(0) += count;
                }
            }

            ViolationFeed {
                overview: ViolationOverview {
                    total_requests,
                    total_violations: index.total(),
                    integrations: by_integration
                        .into_iter()
                        .map(|(name, unallocated_requests)| IntegrationUsage {
                            name: name.to_string(),
                            unallocated_requests,
                        })
                        .collect(),
                },
                index,
            }
        })
    }

    async fn fetch_requests(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<Vec<RequestRecord>> {
        self.with_account(account, |acct| {
            let mut records: Vec<RequestRecord> = acct
                .requests
                .iter()
                .filter(|r| r.start_time_ms < end_ms && r.end_time_ms >= start_ms)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.start_time_ms);
            records
        })
    }

    async fn health_check(&self) -> GatewayResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}
