//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::{AnalyticsSettings, ConfigError};
use crate::gateway::ConcurrencyGateway;
use crate::services::pipeline::InsightsPipeline;
use crate::services::view_state::ViewRegistry;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Gateway to the capacity-monitoring service
    pub gateway: Arc<dyn ConcurrencyGateway>,
    pub pipeline: Arc<InsightsPipeline>,
    /// Retained views, keyed by account and coordinates
    pub views: ViewRegistry,
}

impl AppState {
    /// Create the application state over `gateway` with the given analytics settings.
    pub fn new(
        gateway: Arc<dyn ConcurrencyGateway>,
        settings: &AnalyticsSettings,
    ) -> Result<Self, ConfigError> {
        let pipeline = InsightsPipeline::new(Arc::clone(&gateway), settings)?;
        Ok(Self {
            gateway,
            pipeline: Arc::new(pipeline),
            views: ViewRegistry::new(),
        })
    }
}
