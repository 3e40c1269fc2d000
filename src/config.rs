//! Configuration management
//!
//! Settings come from an optional YAML file and are then overridden by
//! command line flags and `SOLAREDGE_*` environment variables (see `cli`).
//! [`Config::validate`] runs before any request is made or any listener is
//! bound, so configuration problems are fatal at startup.

use crate::error::{Result, SolarEdgeError};
use crate::flow::BatterySignPolicy;
use crate::time::SiteZone;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monitoring API access
    pub api: ApiConfig,

    /// HTTP relay settings
    pub relay: RelayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Monitoring API access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key issued in the monitoring portal
    pub api_key: String,

    /// Base URL of the monitoring API
    pub base_url: String,

    /// Site to query
    pub site_id: String,

    /// IANA zone of the site; host local zone when unset
    pub timezone: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// HTTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen address, `host:port`
    pub listen: String,

    /// Power flow refresh interval in seconds
    pub flow_interval_secs: u64,

    /// Overview refresh interval in seconds
    pub poll_interval_secs: u64,

    /// Refetch site details on the overview timer
    pub refresh_details: bool,

    /// Storage states reported as discharging in `/flow`
    pub battery_sign: BatterySignPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json_format: bool,

    /// Optional log file; rotated daily next to the given path
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,
}

impl ApiConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the configured zone name
    pub fn site_zone(&self) -> Result<SiteZone> {
        SiteZone::from_optional_name(self.timezone.as_deref())
    }
}

impl RelayConfig {
    pub const fn flow_interval(&self) -> Duration {
        Duration::from_secs(self.flow_interval_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path`, or from the first default location that exists.
    ///
    /// Without an explicit path and without any file, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_paths = ["solaredge.yaml", "/etc/solaredge/config.yaml"];
        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate what every command needs: credentials, endpoint, zone
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(SolarEdgeError::validation(
                "api.api_key",
                "API key cannot be empty",
            ));
        }

        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SolarEdgeError::validation(
                "api.base_url".to_string(),
                format!("{base:?} is not an http(s) URL"),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(SolarEdgeError::validation(
                "api.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        self.api.site_zone()?;
        Ok(())
    }

    /// Validate everything the relay needs on top of [`Config::validate`]
    pub fn validate_relay(&self) -> Result<()> {
        self.validate()?;
        self.validate_site()?;

        if self.relay.listen.trim().is_empty() {
            return Err(SolarEdgeError::validation(
                "relay.listen",
                "Listen address cannot be empty",
            ));
        }

        if self.relay.flow_interval_secs == 0 {
            return Err(SolarEdgeError::validation(
                "relay.flow_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.relay.poll_interval_secs == 0 {
            return Err(SolarEdgeError::validation(
                "relay.poll_interval_secs",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Site scoped commands need a site id
    pub fn validate_site(&self) -> Result<()> {
        if self.api.site_id.trim().is_empty() {
            return Err(SolarEdgeError::validation(
                "api.site_id",
                "Site id cannot be empty",
            ));
        }
        Ok(())
    }
}
