//! Ferry countdown sign for Linux hosts.
//!
//! Runs the setup portal on a NetworkManager hotspot, then polls departures
//! and draws the countdown to the terminal.

mod config;
mod radio;
mod renderer;

use ferry_core::settings::{read_secret, KEY_API_KEY};
use ferry_core::{DisplayController, FileSettingsStore, Geometry, RouteTable, SettingsStore};
use ferry_portal::lifecycle;
use ferry_transit::{DepartureCalculator, SystemClock, TransitConfig, TransitlandClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DeviceConfig;
use crate::radio::NetworkManagerRadio;
use crate::renderer::TerminalRenderer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,ferry_portal=debug,ferry_transit=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Ferry sign starting...");

    let device = DeviceConfig::from_env()?;
    let portal_config = device.portal_config();

    let store = FileSettingsStore::new(&device.settings_path);
    let api_key = match read_secret(&device.secrets_path, KEY_API_KEY) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("Could not read {}: {}", device.secrets_path.display(), e);
            String::new()
        }
    };
    if api_key.is_empty() {
        tracing::warn!("No transit API key configured; departures will not load");
    }
    lifecycle::log_configuration(&store.load_or_default(), &api_key);

    let client = TransitlandClient::new(TransitConfig::with_api_key(api_key))?;
    let calculator = DepartureCalculator::new(client, SystemClock::new());
    let mut display = DisplayController::new(TerminalRenderer::new(), Geometry::default());
    let radio = NetworkManagerRadio::new(&device.wifi_interface);

    lifecycle::run(
        &portal_config,
        RouteTable::nyc_ferry(),
        &store,
        &radio,
        &calculator,
        &mut display,
    )
    .await?;

    Ok(())
}
