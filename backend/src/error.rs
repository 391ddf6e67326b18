//! Error types for the analytics pipeline.

use crate::gateway::GatewayError;

/// Result type for pipeline operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Error type for the analytics pipeline.
///
/// `InvalidSelection` and `InvalidLinkParameters` are raised before any fetch
/// is attempted and block rendering. `RemoteFetchFailure` is caught at the view
/// boundary and turned into an error banner over the previous results.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Missing or invalid link parameters: {0}")]
    InvalidLinkParameters(String),

    #[error("Invalid grid span: {0}")]
    InvalidGridSpan(usize),

    #[error("Remote fetch failed: {0}")]
    RemoteFetchFailure(#[from] GatewayError),
}

impl AnalyticsError {
    /// Whether this error should be shown over previous results instead of
    /// replacing them. An unknown account is not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalyticsError::RemoteFetchFailure(err) if !matches!(err, GatewayError::NotFound(_)))
    }
}
