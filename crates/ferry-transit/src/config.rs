//! Transit provider configuration.

use std::time::Duration;

/// Transitland REST API root.
pub const DEFAULT_API_BASE: &str = "https://transit.land/api/v2/rest";

/// Wall-clock source used when the local clock has not been set.
pub const DEFAULT_TIME_API: &str = "http://worldtimeapi.org/api/timezone/America/New_York";

/// Connection settings for the transit and time APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitConfig {
    pub api_base: String,
    pub api_key: String,
    pub time_api_url: String,
    pub request_timeout: Duration,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            time_api_url: DEFAULT_TIME_API.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl TransitConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Departures endpoint for a stop.
    pub fn departures_url(&self, stop_id: &str) -> String {
        format!(
            "{}/stops/{}/departures?api_key={}",
            self.api_base.trim_end_matches('/'),
            stop_id,
            self.api_key
        )
    }
}
