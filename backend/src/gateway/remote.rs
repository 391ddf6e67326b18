//! HTTP gateway for the remote capacity-monitoring service.
//!
//! Endpoints are paginated with `offset`/`limit` query parameters. Each page
//! carries a `next_offset` while more data remains; the first page also carries
//! the feed's overview block.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::error::{GatewayError, GatewayResult};
use super::source::ConcurrencyGateway;
use crate::api::AccountId;
use crate::config::GatewaySettings;
use crate::models::{
    ConcurrencyFeed, ConcurrencyOverview, ConcurrencyPoint, RequestRecord, ViolationFeed,
    ViolationOverview,
};

/// Upper bound on pages followed for a single fetch.
const MAX_PAGES: usize = 10_000;

#[derive(Debug, Deserialize)]
struct Page<T, O> {
    items: Vec<T>,
    #[serde(default)]
    next_offset: Option<u64>,
    overview: Option<O>,
}

#[derive(Debug, Deserialize)]
struct ViolationItem {
    timestamp_ms: i64,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct NoOverview {}

/// Gateway backed by the remote service's REST API.
#[derive(Clone)]
pub struct RemoteGateway {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    page_size: u32,
}

impl RemoteGateway {
    /// Build a gateway from configuration.
    pub fn new(settings: &GatewaySettings) -> GatewayResult<Self> {
        if settings.base_url.trim().is_empty() {
            return Err(GatewayError::ConfigurationError(
                "Remote gateway requires gateway.base_url".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
            page_size: settings.page_size.max(1),
        })
    }

    async fn fetch_page<T, O>(
        &self,
        url: &str,
        start_ms: i64,
        end_ms: i64,
        offset: u64,
    ) -> GatewayResult<Page<T, O>>
    where
        T: DeserializeOwned,
        O: DeserializeOwned,
    {
        let mut request = self.client.get(url).query(&[
            ("start", start_ms.to_string()),
            ("end", end_ms.to_string()),
            ("offset", offset.to_string()),
            ("limit", self.page_size.to_string()),
        ]);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::ConnectionError(format!("GET {} failed: {}", url, e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(GatewayError::NotFound(format!("GET {} returned 404", url)))
            }
            status => {
                return Err(GatewayError::QueryError(format!(
                    "GET {} returned {}",
                    url, status
                )))
            }
        }

        response
            .json::<Page<T, O>>()
            .await
            .map_err(|e| GatewayError::DecodeError(format!("Invalid page from {}: {}", url, e)))
    }

    /// Follow pagination until exhausted, returning all items and the first overview seen.
    async fn fetch_all<T, O>(
        &self,
        account: &AccountId,
        resource: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<(Vec<T>, Option<O>)>
    where
        T: DeserializeOwned,
        O: DeserializeOwned,
    {
        let url = format!("{}/accounts/{}/{}", self.base_url, account, resource);
        let mut items = Vec::new();
        let mut overview = None;
        let mut offset = 0u64;

        for page_number in 0..MAX_PAGES {
            let page: Page<T, O> = self.fetch_page(&url, start_ms, end_ms, offset).await?;
            items.extend(page.items);
            if overview.is_none() {
                overview = page.overview;
            }
            match page.next_offset {
                Some(next) if next > offset => offset = next,
                Some(next) => {
                    return Err(GatewayError::QueryError(format!(
                        "Pagination for {} did not advance (offset {} -> {})",
                        url, offset, next
                    )))
                }
                None => {
                    debug!(
                        "Fetched {} {} items in {} pages",
                        items.len(),
                        resource,
                        page_number + 1
                    );
                    return Ok((items, overview));
                }
            }
        }

        Err(GatewayError::QueryError(format!(
            "Pagination for {} exceeded {} pages",
            url, MAX_PAGES
        )))
    }
}

#[async_trait]
impl ConcurrencyGateway for RemoteGateway {
    async fn fetch_concurrency(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<ConcurrencyFeed> {
        let (points, overview) = self
            .fetch_all::<ConcurrencyPoint, ConcurrencyOverview>(
                account,
                "concurrency",
                start_ms,
                end_ms,
            )
            .await?;
        let overview = overview.ok_or_else(|| {
            GatewayError::DecodeError("Concurrency feed is missing its overview".to_string())
        })?;
        Ok(ConcurrencyFeed { points, overview })
    }

    async fn fetch_violations(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<ViolationFeed> {
        let (items, overview) = self
            .fetch_all::<ViolationItem, ViolationOverview>(
                account,
                "violations",
                start_ms,
                end_ms,
            )
            .await?;
        Ok(ViolationFeed {
            index: items
                .into_iter()
                .map(|item| (item.timestamp_ms, item.count))
                .collect(),
            overview: overview.unwrap_or_default(),
        })
    }

    async fn fetch_requests(
        &self,
        account: &AccountId,
        start_ms: i64,
        end_ms: i64,
    ) -> GatewayResult<Vec<RequestRecord>> {
        let (records, _) = self
            .fetch_all::<RequestRecord, NoOverview>(account, "requests", start_ms, end_ms)
            .await?;
        Ok(records)
    }

    async fn health_check(&self) -> GatewayResult<bool> {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) if e.is_connect() || e.is_timeout() => Ok(false),
            Err(e) => Err(GatewayError::ConnectionError(e.to_string())),
        }
    }
}
