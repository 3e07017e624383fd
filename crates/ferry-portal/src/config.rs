//! Portal and lifecycle configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::wifi::AccessPointConfig;

/// Timing and addressing for the configuration portal and the poll loop.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Address the portal listens on.
    pub bind_addr: SocketAddr,
    /// Access point the portal is served over.
    pub access_point: AccessPointConfig,
    /// How long one accept waits before re-checking state.
    pub accept_timeout: Duration,
    /// Size of the single request read.
    pub request_buffer: usize,
    /// Bytes per send.
    pub chunk_size: usize,
    /// Pause between sends.
    pub chunk_pause: Duration,
    /// Wait after the final form response before the AP goes down.
    pub handoff_delay: Duration,
    /// Poll period while the display is healthy.
    pub poll_interval: Duration,
    /// Poll period after a failed cycle.
    pub error_poll_interval: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([192, 168, 4, 1], 80)),
            access_point: AccessPointConfig::default(),
            accept_timeout: Duration::from_secs(1),
            request_buffer: 1024,
            chunk_size: ferry_protocol::CHUNK_SIZE,
            chunk_pause: Duration::from_millis(10),
            handoff_delay: Duration::from_secs(8),
            poll_interval: Duration::from_secs(45),
            error_poll_interval: Duration::from_secs(60),
        }
    }
}
