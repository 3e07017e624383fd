//! # ferry-portal
//!
//! Captive configuration portal and device lifecycle for the ferry sign.
//!
//! - [`Portal`]: the WiFi → ferry configuration state machine
//! - [`PortalServer`]: one-client-at-a-time HTTP loop with chunked sends
//! - [`lifecycle`]: access point, portal, handoff to the home network, and
//!   the departure poll loop
//! - [`WifiRadio`]: the radio seam implemented per platform

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pages;
pub mod portal;
pub mod server;
pub mod wifi;

pub use config::PortalConfig;
pub use error::PortalError;
pub use portal::{Portal, PortalReply, PortalState, Transition};
pub use server::{send_chunked, PortalServer};
pub use wifi::{AccessPointConfig, RadioError, ScanResult, WifiRadio};
