//! Device configuration from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use ferry_portal::{AccessPointConfig, PortalConfig};

/// Channels the access point may use.
const AP_CHANNELS: std::ops::RangeInclusive<u8> = 1..=11;

/// Host-level settings, each overridable by an environment variable.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub access_point: AccessPointConfig,
    pub bind_addr: SocketAddr,
    pub settings_path: PathBuf,
    pub secrets_path: PathBuf,
    pub wifi_interface: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            access_point: AccessPointConfig::default(),
            bind_addr: SocketAddr::from(([192, 168, 4, 1], 80)),
            settings_path: PathBuf::from("settings.toml"),
            secrets_path: PathBuf::from("secrets.toml"),
            wifi_interface: "wlan0".to_string(),
        }
    }
}

impl DeviceConfig {
    /// Defaults overlaid with `FERRY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ssid) = lookup("FERRY_AP_SSID") {
            config.access_point.ssid = ssid;
        }
        if let Some(password) = lookup("FERRY_AP_PASSWORD") {
            if password.len() < 8 {
                bail!("FERRY_AP_PASSWORD must be at least 8 characters");
            }
            config.access_point.password = password;
        }
        if let Some(channel) = parse_var(&lookup, "FERRY_AP_CHANNEL")? {
            if !AP_CHANNELS.contains(&channel) {
                bail!("FERRY_AP_CHANNEL must be between 1 and 11, got {}", channel);
            }
            config.access_point.channel = channel;
        }
        if let Some(addr) = parse_var(&lookup, "FERRY_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup("FERRY_SETTINGS_PATH") {
            config.settings_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("FERRY_SECRETS_PATH") {
            config.secrets_path = PathBuf::from(path);
        }
        if let Some(interface) = lookup("FERRY_WIFI_INTERFACE") {
            config.wifi_interface = interface;
        }

        Ok(config)
    }

    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            bind_addr: self.bind_addr,
            access_point: self.access_point.clone(),
            ..PortalConfig::default()
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("Invalid {}: {:?}", key, raw)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.access_point.ssid, "Commute Clock NYC");
        assert_eq!(config.access_point.password, "ferry123");
        assert_eq!(config.access_point.channel, 6);
        assert_eq!(config.bind_addr.to_string(), "192.168.4.1:80");
        assert_eq!(config.settings_path, PathBuf::from("settings.toml"));
    }

    #[test]
    fn test_overrides() {
        let config = DeviceConfig::from_lookup(lookup(&[
            ("FERRY_AP_SSID", "Dock Sign"),
            ("FERRY_AP_CHANNEL", "11"),
            ("FERRY_BIND_ADDR", "0.0.0.0:8080"),
            ("FERRY_WIFI_INTERFACE", "wlp2s0"),
        ]))
        .unwrap();
        assert_eq!(config.access_point.ssid, "Dock Sign");
        assert_eq!(config.access_point.channel, 11);
        assert_eq!(config.portal_config().bind_addr.port(), 8080);
        assert_eq!(config.portal_config().access_point.ssid, "Dock Sign");
        assert_eq!(config.wifi_interface, "wlp2s0");
    }

    #[test]
    fn test_invalid_values() {
        assert!(DeviceConfig::from_lookup(lookup(&[("FERRY_AP_CHANNEL", "13")])).is_err());
        assert!(DeviceConfig::from_lookup(lookup(&[("FERRY_AP_CHANNEL", "six")])).is_err());
        assert!(DeviceConfig::from_lookup(lookup(&[("FERRY_AP_PASSWORD", "short")])).is_err());
        assert!(DeviceConfig::from_lookup(lookup(&[("FERRY_BIND_ADDR", "nowhere")])).is_err());
    }
}
