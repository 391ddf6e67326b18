//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::gateway::GatewayError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Pipeline error
    Analytics(AnalyticsError),
}

impl AppError {
    fn parts(self) -> (StatusCode, ApiError) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Analytics(err) => {
                let msg = err.to_string();
                match err {
                    AnalyticsError::InvalidSelection(_) => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("INVALID_SELECTION", msg),
                    ),
                    AnalyticsError::InvalidLinkParameters(_) => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("INVALID_LINK_PARAMETERS", msg)
                            .with_details("missing parameters"),
                    ),
                    AnalyticsError::InvalidGridSpan(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("INTERNAL_ERROR", msg),
                    ),
                    AnalyticsError::RemoteFetchFailure(GatewayError::NotFound(detail)) => (
                        StatusCode::NOT_FOUND,
                        ApiError::new("NOT_FOUND", detail),
                    ),
                    AnalyticsError::RemoteFetchFailure(source) => (
                        StatusCode::BAD_GATEWAY,
                        ApiError::new("REMOTE_FETCH_FAILURE", "Remote fetch failed")
                            .with_details(source.to_string()),
                    ),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        (status, Json(error)).into_response()
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        AppError::Analytics(err)
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Analytics(AnalyticsError::RemoteFetchFailure(err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::from(AnalyticsError::InvalidSelection("days".into())), StatusCode::BAD_REQUEST, "INVALID_SELECTION"),
            (AppError::from(AnalyticsError::InvalidLinkParameters("end".into())), StatusCode::BAD_REQUEST, "INVALID_LINK_PARAMETERS"),
            (AppError::from(GatewayError::NotFound("acct".into())), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::from(GatewayError::ConnectionError("down".into())), StatusCode::BAD_GATEWAY, "REMOTE_FETCH_FAILURE"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::from(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            let (got_status, body) = err.parts();
            assert_eq!(got_status, status);
            assert_eq!(body.code, code);
        }
    }
}
