//! Gateway factory for dependency injection.
//!
//! This module provides utilities for creating and configuring gateway
//! instances based on runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::error::{GatewayError, GatewayResult};
use super::local::LocalGateway;
#[cfg(feature = "remote-gateway")]
use super::remote::RemoteGateway;
use super::source::ConcurrencyGateway;
use crate::config::GatewaySettings;

/// Gateway type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayType {
    /// HTTP client for the capacity-monitoring service
    Remote,
    /// In-memory local gateway
    Local,
}

impl FromStr for GatewayType {
    type Err = String;

    /// Parse gateway type from string ("remote", "http", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" | "http" => Ok(Self::Remote),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown gateway type: {}", s)),
        }
    }
}

/// Factory for creating gateway instances.
pub struct GatewayFactory;

impl GatewayFactory {
    /// Create a gateway instance based on type.
    ///
    /// # Arguments
    /// * `gateway_type` - Type of gateway to create
    /// * `settings` - Gateway settings (base URL and timeouts are required for Remote)
    pub fn create(
        gateway_type: GatewayType,
        settings: &GatewaySettings,
    ) -> GatewayResult<Arc<dyn ConcurrencyGateway>> {
        match gateway_type {
            GatewayType::Remote => {
                #[cfg(feature = "remote-gateway")]
                {
                    let remote = RemoteGateway::new(settings)?;
                    Ok(Arc::new(remote) as Arc<dyn ConcurrencyGateway>)
                }
                #[cfg(not(feature = "remote-gateway"))]
                {
                    let _ = settings;
                    Err(GatewayError::ConfigurationError(
                        "Remote gateway feature not enabled".to_string(),
                    ))
                }
            }
            GatewayType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a gateway from its settings, honouring the configured type.
    pub fn from_settings(settings: &GatewaySettings) -> GatewayResult<Arc<dyn ConcurrencyGateway>> {
        let gateway_type = settings
            .gateway_type
            .parse::<GatewayType>()
            .map_err(GatewayError::ConfigurationError)?;
        Self::create(gateway_type, settings)
    }

    /// Create an empty in-memory gateway.
    pub fn create_local() -> Arc<dyn ConcurrencyGateway> {
        Arc::new(LocalGateway::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_type_from_str() {
        assert_eq!("remote".parse::<GatewayType>(), Ok(GatewayType::Remote));
        assert_eq!("HTTP".parse::<GatewayType>(), Ok(GatewayType::Remote));
        assert_eq!("local".parse::<GatewayType>(), Ok(GatewayType::Local));
        assert!("postgres".parse::<GatewayType>().is_err());
    }

    #[tokio::test]
    async fn test_create_local() {
        let gateway = GatewayFactory::create(GatewayType::Local, &GatewaySettings::default()).unwrap();
        assert!(gateway.health_check().await.unwrap());
    }

    #[test]
    fn test_from_settings_rejects_unknown_type() {
        let settings = GatewaySettings {
            gateway_type: "carrier-pigeon".to_string(),
            ..GatewaySettings::default()
        };
        assert!(matches!(
            GatewayFactory::from_settings(&settings),
            Err(GatewayError::ConfigurationError(_))
        ));
    }
}
