//! Configuration file and environment variable support.
//!
//! Settings are read from `insights.toml` and may be overridden through
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) yields a working local setup.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::TimestampFormatter;
use crate::services::overview::LimitBand;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

/// Connection settings for the capacity-monitoring service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(rename = "type", default = "default_gateway_type")]
    pub gateway_type: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Aggregation and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Offset east of UTC, in minutes, used for calendar days and labels.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Lower bound of the close-to-limit band, as a percentage of the limit.
    #[serde(default = "default_close_lower_pct")]
    pub close_to_limit_lower_pct: f64,
    /// Upper bound (exclusive) of the close-to-limit band.
    #[serde(default = "default_close_upper_pct")]
    pub close_to_limit_upper_pct: f64,
    #[serde(default = "default_top_integrations")]
    pub top_integrations: usize,
    #[serde(default = "default_row_span")]
    pub row_span: usize,
}

fn default_gateway_type() -> String {
    "local".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    1000
}

fn default_close_lower_pct() -> f64 {
    90.0
}

fn default_close_upper_pct() -> f64 {
    100.0
}

fn default_top_integrations() -> usize {
    5
}

fn default_row_span() -> usize {
    24
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            gateway_type: default_gateway_type(),
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            api_token: None,
        }
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            close_to_limit_lower_pct: default_close_lower_pct(),
            close_to_limit_upper_pct: default_close_upper_pct(),
            top_integrations: default_top_integrations(),
            row_span: default_row_span(),
        }
    }
}

impl AnalyticsSettings {
    /// Check that the settings describe a usable pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limit_band()?;
        self.formatter()?;
        if self.row_span == 0 {
            return Err(ConfigError::Invalid("row_span must be positive".to_string()));
        }
        Ok(())
    }

    pub fn limit_band(&self) -> Result<LimitBand, ConfigError> {
        LimitBand::new(self.close_to_limit_lower_pct, self.close_to_limit_upper_pct)
            .map_err(ConfigError::Invalid)
    }

    pub fn formatter(&self) -> Result<TimestampFormatter, ConfigError> {
        TimestampFormatter::from_offset_minutes(self.utc_offset_minutes).map_err(ConfigError::Invalid)
    }
}

impl InsightsConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: InsightsConfig = toml::from_str(content)?;
        config.analytics.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `insights.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("insights.toml"),
            PathBuf::from("backend/insights.toml"),
            PathBuf::from("../insights.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Err(ConfigError::Invalid(
            "No insights.toml found in standard locations".to_string(),
        ))
    }

    /// Load from the default location (falling back to defaults) and apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = match Self::from_default_location() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default configuration: {}", e);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    /// Apply environment overrides.
    ///
    /// # Environment Variables
    /// - `GATEWAY_TYPE`: `local` | `remote`
    /// - `GATEWAY_BASE_URL`: base URL of the remote service (implies `remote` when `GATEWAY_TYPE` is unset)
    /// - `GATEWAY_API_TOKEN`: bearer token for the remote service
    /// - `INSIGHTS_UTC_OFFSET_MINUTES`: calendar offset east of UTC
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("GATEWAY_BASE_URL") {
            self.gateway.base_url = url;
            self.gateway.gateway_type = "remote".to_string();
        }
        if let Ok(kind) = env::var("GATEWAY_TYPE") {
            self.gateway.gateway_type = kind;
        }
        if let Ok(token) = env::var("GATEWAY_API_TOKEN") {
            self.gateway.api_token = Some(token);
        }
        if let Ok(offset) = env::var("INSIGHTS_UTC_OFFSET_MINUTES") {
            match offset.parse() {
                Ok(minutes) => self.analytics.utc_offset_minutes = minutes,
                Err(_) => log::warn!(
                    "Ignoring INSIGHTS_UTC_OFFSET_MINUTES={}: not an integer",
                    offset
                ),
            }
        }
    }
}
