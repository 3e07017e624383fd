//! NetworkManager-backed WiFi radio.
//!
//! Drives `nmcli` for scanning, joining and the setup hotspot, and the
//! system `ping` for the reachability probe.

use std::process::Stdio;

use ferry_portal::{AccessPointConfig, RadioError, ScanResult, WifiRadio};
use tokio::net::lookup_host;
use tokio::process::Command;
use tracing::debug;

/// NetworkManager connection name used for the setup hotspot.
const HOTSPOT_CONNECTION: &str = "ferry-setup";

/// Address the portal is served on while the hotspot is up.
const HOTSPOT_ADDRESS: &str = "192.168.4.1/24";

const PROBE_HOST: &str = "8.8.8.8";
const RESOLVE_HOST: &str = "transit.land:443";

pub struct NetworkManagerRadio {
    interface: String,
}

impl NetworkManagerRadio {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    async fn nmcli(&self, args: &[&str]) -> Result<String, String> {
        debug!("nmcli {}", args.first().copied().unwrap_or_default());
        let output = Command::new("nmcli")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("could not run nmcli: {}", e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

impl WifiRadio for NetworkManagerRadio {
    async fn scan(&self) -> Result<Vec<ScanResult>, RadioError> {
        let output = self
            .nmcli(&[
                "-t", "-f", "SSID,SIGNAL,CHAN", "device", "wifi", "list", "--rescan", "yes",
                "ifname", self.interface.as_str(),
            ])
            .await
            .map_err(RadioError::Scan)?;
        Ok(parse_scan(&output))
    }

    async fn connect(&self, ssid: &str, password: &str) -> Result<(), RadioError> {
        self.nmcli(&[
            "device", "wifi", "connect", ssid, "password", password, "ifname", self.interface.as_str(),
        ])
        .await
        .map(|_| ())
        .map_err(RadioError::Join)
    }

    async fn ping(&self) -> Result<(), RadioError> {
        let status = Command::new("ping")
            .args(["-c", "1", "-W", "5", PROBE_HOST])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| RadioError::Unreachable(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(RadioError::Unreachable(format!("{} did not answer", PROBE_HOST)))
        }
    }

    async fn has_internet(&self) -> bool {
        match lookup_host(RESOLVE_HOST).await {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(e) => {
                debug!("Could not resolve {}: {}", RESOLVE_HOST, e);
                false
            }
        }
    }

    async fn start_access_point(&self, config: &AccessPointConfig) -> Result<(), RadioError> {
        let channel = config.channel.to_string();
        self.nmcli(&[
            "device", "wifi", "hotspot", "ifname", self.interface.as_str(), "con-name", HOTSPOT_CONNECTION,
            "ssid", config.ssid.as_str(), "band", "bg", "channel", channel.as_str(), "password", config.password.as_str(),
        ])
        .await
        .map_err(RadioError::AccessPoint)?;

        self.nmcli(&[
            "connection", "modify", HOTSPOT_CONNECTION, "ipv4.method", "shared",
            "ipv4.addresses", HOTSPOT_ADDRESS,
        ])
        .await
        .map_err(RadioError::AccessPoint)?;

        self.nmcli(&["connection", "up", HOTSPOT_CONNECTION])
            .await
            .map(|_| ())
            .map_err(RadioError::AccessPoint)
    }

    async fn stop_access_point(&self) -> Result<(), RadioError> {
        self.nmcli(&["connection", "down", HOTSPOT_CONNECTION])
            .await
            .map(|_| ())
            .map_err(RadioError::AccessPoint)
    }
}

/// Parse `nmcli -t -f SSID,SIGNAL,CHAN` output. Colons inside an SSID are
/// escaped as `\:`.
pub fn parse_scan(output: &str) -> Vec<ScanResult> {
    output
        .lines()
        .filter_map(|line| {
            let fields = split_terse(line);
            let [ssid, signal, channel] = fields.as_slice() else {
                return None;
            };
            Some(ScanResult {
                ssid: ssid.clone(),
                rssi: signal_to_rssi(signal.parse().ok()?),
                channel: channel.parse().ok()?,
            })
        })
        .collect()
}

/// NetworkManager reports signal as 0-100; map it onto -100..-50 dBm.
pub fn signal_to_rssi(signal: u8) -> i32 {
    i32::from(signal.min(100)) / 2 - 100
}

fn split_terse(line: &str) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let (Some(next), Some(field)) = (chars.next(), fields.last_mut()) {
                    field.push(next);
                }
            }
            ':' => fields.push(String::new()),
            _ => {
                if let Some(field) = fields.last_mut() {
                    field.push(c);
                }
            }
        }
    }
    fields
}
