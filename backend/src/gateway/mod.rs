//! Gateway to the external capacity-monitoring service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Pipeline (services::pipeline) - resolve/fetch/aggregate │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  ConcurrencyGateway trait (source.rs)                    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────────┐
//!     │ LocalGateway        RemoteGateway     │
//!     │ (in-memory)         (reqwest, paged)  │
//!     └──────────────────────────────────────┘
//! ```

#[cfg(not(any(feature = "remote-gateway", feature = "local-gateway")))]
compile_error!("Enable at least one gateway backend feature.");

pub mod error;
pub mod factory;
pub mod local;
#[cfg(feature = "remote-gateway")]
pub mod remote;
pub mod source;

pub use error::{GatewayError, GatewayResult};
pub use factory::{GatewayFactory, GatewayType};
pub use local::LocalGateway;
#[cfg(feature = "remote-gateway")]
pub use remote::RemoteGateway;
pub use source::ConcurrencyGateway;

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

use crate::config::InsightsConfig;

/// Global gateway instance initialized once per process.
static GATEWAY: OnceLock<Arc<dyn ConcurrencyGateway>> = OnceLock::new();

/// Initialize the global gateway from configuration.
pub fn init_gateway(config: &InsightsConfig) -> Result<()> {
    if GATEWAY.get().is_some() {
        return Ok(());
    }

    let gateway = GatewayFactory::from_settings(&config.gateway)
        .map_err(|e| anyhow::Error::msg(e.to_string()))
        .context("Failed to create gateway")?;
    let _ = GATEWAY.set(gateway);
    Ok(())
}

/// Get a reference to the global gateway instance.
pub fn get_gateway() -> Result<&'static Arc<dyn ConcurrencyGateway>> {
    if GATEWAY.get().is_none() {
        let _ = init_gateway(&InsightsConfig::load());
    }

    GATEWAY
        .get()
        .context("Gateway not initialized. Call init_gateway() first.")
}
