//! Error types for gateway operations.

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error type for gateway operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<String> for GatewayError {
    fn from(s: String) -> Self {
        GatewayError::InternalError(s)
    }
}

impl From<&str> for GatewayError {
    fn from(s: &str) -> Self {
        GatewayError::InternalError(s.to_string())
    }
}
