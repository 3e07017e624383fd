//! WiFi radio seam.
//!
//! The portal needs a radio that can scan, join a network, probe for
//! internet access, and run the setup access point. [`WifiRadio`] is that
//! seam; the Linux binary implements it over NetworkManager.

use std::collections::HashSet;
use std::future::Future;

use thiserror::Error;

/// Networks offered on the WiFi page.
pub const MAX_LISTED_NETWORKS: usize = 5;

/// SSIDs longer than this are shortened for display.
pub const SSID_DISPLAY_LIMIT: usize = 20;

/// Characters kept when an SSID is shortened.
pub const SSID_TRUNCATED_LEN: usize = 17;

/// Radio failures.
#[derive(Debug, Error)]
pub enum RadioError {
    #[error("Scan failed: {0}")]
    Scan(String),

    #[error("Join failed: {0}")]
    Join(String),

    #[error("No internet connectivity: {0}")]
    Unreachable(String),

    #[error("Access point error: {0}")]
    AccessPoint(String),
}

/// One network seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub ssid: String,
    /// Signal strength in dBm; higher is stronger.
    pub rssi: i32,
    pub channel: u8,
}

/// The setup access point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointConfig {
    pub ssid: String,
    pub password: String,
    pub channel: u8,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: "Commute Clock NYC".to_string(),
            password: "ferry123".to_string(),
            channel: 6,
        }
    }
}

/// WiFi hardware used by the portal and the handoff.
pub trait WifiRadio: Send + Sync {
    /// Networks currently visible, in any order.
    fn scan(&self) -> impl Future<Output = Result<Vec<ScanResult>, RadioError>> + Send;

    /// Join a network as a station.
    fn connect(
        &self,
        ssid: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), RadioError>> + Send;

    /// Ping a public host over the joined network.
    fn ping(&self) -> impl Future<Output = Result<(), RadioError>> + Send;

    /// Resolve a public host over the joined network.
    fn has_internet(&self) -> impl Future<Output = bool> + Send;

    fn start_access_point(
        &self,
        config: &AccessPointConfig,
    ) -> impl Future<Output = Result<(), RadioError>> + Send;

    fn stop_access_point(&self) -> impl Future<Output = Result<(), RadioError>> + Send;
}

/// Join and verify reachability.
pub async fn join_and_verify<W: WifiRadio>(
    radio: &W,
    ssid: &str,
    password: &str,
) -> Result<(), RadioError> {
    radio.connect(ssid, password).await?;
    radio.ping().await
}

/// Networks worth offering: named, one entry per SSID (first seen wins),
/// strongest first, at most [`MAX_LISTED_NETWORKS`].
pub fn select_networks(scan: Vec<ScanResult>) -> Vec<ScanResult> {
    let mut seen = HashSet::new();
    let mut networks: Vec<ScanResult> = scan
        .into_iter()
        .filter(|n| !n.ssid.is_empty())
        .filter(|n| seen.insert(n.ssid.clone()))
        .collect();
    networks.sort_by(|a, b| b.rssi.cmp(&a.rssi));
    networks.truncate(MAX_LISTED_NETWORKS);
    networks
}

/// SSID as shown in the network list.
pub fn display_ssid(ssid: &str) -> String {
    if ssid.chars().count() > SSID_DISPLAY_LIMIT {
        let head: String = ssid.chars().take(SSID_TRUNCATED_LEN).collect();
        format!("{}...", head)
    } else {
        ssid.to_string()
    }
}
