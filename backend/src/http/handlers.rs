//! HTTP handlers for the REST API.
//!
//! Each handler decodes its route into a selection or drill-down link and
//! refreshes the view retained for that account and those coordinates.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use log::debug;
use std::collections::HashMap;

use super::dto::{HealthResponse, SummaryQuery, ViewSnapshot};
use super::error::AppError;
use super::state::AppState;
use crate::api::{AccountId, DetailView, RequestView, SummaryView};
use crate::routes::detail::GET_CONCURRENCY_DETAIL;
use crate::routes::request::GET_CONCURRENCY_REQUESTS;
use crate::routes::summary::GET_CONCURRENCY_SUMMARY;
use crate::services::drilldown::{DetailLink, RequestLink};
use crate::services::time_range::{TimeRangeSelection, DEFAULT_SUMMARY_DAYS};
use crate::services::view_state::ViewKey;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

type RouteParams = HashMap<String, String>;

fn param<'a>(params: &'a RouteParams, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

fn account(params: &RouteParams) -> Result<AccountId, AppError> {
    param(params, "account_id")
        .filter(|id| !id.is_empty())
        .map(AccountId::new)
        .ok_or_else(|| AppError::BadRequest("missing account_id".to_string()))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint reporting whether the monitoring service answers.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let gateway_status = match state.gateway.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        gateway: gateway_status,
    }))
}

// =============================================================================
// Concurrency views
// =============================================================================

/// GET /v1/accounts/{account_id}/concurrency?days=N
pub async fn get_concurrency_summary(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> HandlerResult<ViewSnapshot<SummaryView>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let days = query.days.unwrap_or(DEFAULT_SUMMARY_DAYS);
    let selection = TimeRangeSelection::summary_days(days)?;
    let account = AccountId::new(account_id);
    debug!("{} for {} ({:?})", GET_CONCURRENCY_SUMMARY, account, selection);

    let key = ViewKey::new(&account, format!("days={}", days));
    let pipeline = &state.pipeline;
    let snapshot = state
        .views
        .summary
        .refresh(&key, || pipeline.load_summary(&account, &selection))
        .await?;
    Ok(Json(snapshot))
}

/// GET /v1/accounts/{account_id}/concurrencyDetail/{start_ms}/{end_ms}
pub async fn get_concurrency_detail(
    State(state): State<AppState>,
    Path(params): Path<RouteParams>,
) -> HandlerResult<ViewSnapshot<DetailView>> {
    let account = account(&params)?;
    let link = DetailLink::decode(param(&params, "start_ms"), param(&params, "end_ms"))?;
    debug!("{} for {} at {}", GET_CONCURRENCY_DETAIL, account, link.path());

    let key = ViewKey::new(&account, link.path());
    let pipeline = &state.pipeline;
    let snapshot = state
        .views
        .detail
        .refresh(&key, || pipeline.load_detail(&account, &link))
        .await?;
    Ok(Json(snapshot))
}

/// GET /v1/accounts/{account_id}/concurrencyRequest/{start_ms}/{end_ms}[/{peak_value}[/{peak_time_ms}]]
pub async fn get_concurrency_requests(
    State(state): State<AppState>,
    Path(params): Path<RouteParams>,
) -> HandlerResult<ViewSnapshot<RequestView>> {
    let account = account(&params)?;
    let link = RequestLink::decode(
        param(&params, "start_ms"),
        param(&params, "end_ms"),
        param(&params, "peak_value"),
        param(&params, "peak_time_ms"),
    )?;
    debug!("{} for {} at {}", GET_CONCURRENCY_REQUESTS, account, link.path());

    let key = ViewKey::new(&account, link.path());
    let pipeline = &state.pipeline;
    let snapshot = state
        .views
        .requests
        .refresh(&key, || pipeline.load_requests(&account, &link))
        .await?;
    Ok(Json(snapshot))
}
