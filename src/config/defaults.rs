use super::*;
use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            site_id: String::new(),
            timezone: None,
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: "localhost:7777".to_string(),
            flow_interval_secs: 60,
            poll_interval_secs: 15 * 60,
            refresh_details: false,
            battery_sign: BatterySignPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            json_format: false,
            file: None,
            backup_count: 5,
        }
    }
}
