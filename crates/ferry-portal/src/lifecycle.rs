//! Device lifecycle: configuration, handoff, operation.
//!
//! Strictly sequential. The access point and portal run until the ferry form
//! is saved, then the AP is torn down, the sign joins the home network, and
//! only if the internet is reachable does the poll loop start. Failing to go
//! online halts the device.

use std::time::Duration;

use ferry_core::{
    DisplayController, FerrySettings, Renderer, RouteTable, SettingsStore, StoredSettings,
};
use ferry_transit::{DepartureCalculator, SettableClock, TransitFeed};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::portal::Portal;
use crate::server::PortalServer;
use crate::wifi::{AccessPointConfig, WifiRadio};

/// Characters of the API key shown in the boot log.
const API_KEY_PREFIX: usize = 10;

// ============================================================================
// Boot
// ============================================================================

/// Lines describing the loaded configuration, with secrets masked.
pub fn configuration_summary(stored: &StoredSettings, api_key: &str) -> Vec<String> {
    let wifi = stored.wifi.clone().unwrap_or_default();
    let ferry = stored.ferry.clone().unwrap_or_default();
    let key_prefix: String = api_key.chars().take(API_KEY_PREFIX).collect();

    vec![
        format!("SSID: '{}' (length: {})", wifi.ssid, wifi.ssid.len()),
        format!(
            "Password: {} (length: {})",
            "*".repeat(wifi.password.chars().count()),
            wifi.password.len()
        ),
        format!("Ferry Route ID: '{}' (length: {})", ferry.route_id, ferry.route_id.len()),
        format!("Ferry Stop ID: '{}' (length: {})", ferry.stop_id, ferry.stop_id.len()),
        format!("Ferry Headsign: '{}' (length: {})", ferry.headsign, ferry.headsign.len()),
        format!("API Key: '{}...' (length: {})", key_prefix, api_key.len()),
    ]
}

pub fn log_configuration(stored: &StoredSettings, api_key: &str) {
    info!("=== Configuration ===");
    for line in configuration_summary(stored, api_key) {
        info!("{}", line);
    }
}

// ============================================================================
// Configuration phase
// ============================================================================

/// Bring up the access point (replacing any previous one).
pub async fn start_access_point<W: WifiRadio>(
    radio: &W,
    config: &AccessPointConfig,
) -> Result<(), PortalError> {
    if let Err(e) = radio.stop_access_point().await {
        debug!("No access point to stop: {}", e);
    }
    radio.start_access_point(config).await?;
    info!(
        "Access point '{}' up on channel {}; connect to configure",
        config.ssid, config.channel
    );
    Ok(())
}

/// Run the portal to completion and bring the sign online.
///
/// Returns the stored ferry settings once the home network is joined and
/// the internet is reachable.
pub async fn configure<S, W, R>(
    config: &PortalConfig,
    routes: RouteTable,
    store: &S,
    radio: &W,
    display: &mut DisplayController<R>,
) -> Result<FerrySettings, PortalError>
where
    S: SettingsStore,
    W: WifiRadio,
    R: Renderer,
{
    start_access_point(radio, &config.access_point).await?;
    let server = PortalServer::bind(config.clone()).await?;

    if let Err(e) = display.show_idle() {
        warn!("Could not show idle boat: {}", e);
    }

    let mut portal = Portal::new(routes, store, radio);
    server.serve_until_complete(&mut portal).await?;

    match radio.stop_access_point().await {
        Ok(()) => info!("Access point stopped"),
        Err(e) => warn!("Error stopping access point: {}", e),
    }

    go_online(store, radio).await?;
    drop(server);

    store
        .load()?
        .ferry
        .ok_or(PortalError::Halted("ferry settings missing after setup"))
}

/// Join the stored home network and confirm internet access.
pub async fn go_online<S, W>(store: &S, radio: &W) -> Result<(), PortalError>
where
    S: SettingsStore,
    W: WifiRadio,
{
    let wifi = store
        .load()?
        .wifi
        .filter(|w| w.is_complete())
        .ok_or(PortalError::Halted("no stored WiFi credentials"))?;

    info!("Connecting to '{}' for departure data", wifi.ssid);
    if let Err(e) = radio.connect(&wifi.ssid, &wifi.password).await {
        error!("Failed to join '{}': {}", wifi.ssid, e);
        return Err(PortalError::Halted("could not join home network"));
    }

    if !radio.has_internet().await {
        error!("Joined '{}' but no internet connection is available", wifi.ssid);
        return Err(PortalError::Halted("no internet connection"));
    }

    info!("Internet connection confirmed");
    Ok(())
}

// ============================================================================
// Operation phase
// ============================================================================

/// One poll: fetch, compute minutes, draw. Returns how long to wait before
/// the next poll.
pub async fn poll_once<F, C, R>(
    config: &PortalConfig,
    calculator: &DepartureCalculator<F, C>,
    ferry: &FerrySettings,
    display: &mut DisplayController<R>,
) -> Duration
where
    F: TransitFeed,
    C: SettableClock,
    R: Renderer,
{
    let minutes = calculator
        .minutes_to_next_departure(&ferry.stop_id, &ferry.headsign, &ferry.route_id)
        .await;

    match display.update(minutes) {
        Ok(mode) => {
            info!("Next ferry: {:?} -> {:?}", minutes, mode);
            config.poll_interval
        }
        Err(e) => {
            error!("Error updating ferry display: {}", e);
            if let Err(e) = display.show_error() {
                error!("Could not show error readout: {}", e);
            }
            config.error_poll_interval
        }
    }
}

/// Fill in the boat color from the catalog when none was stored.
pub fn with_catalog_color(routes: &RouteTable, mut ferry: FerrySettings) -> FerrySettings {
    if ferry.color.is_empty() {
        if let Some(route) = routes.route_by_full_id(&ferry.route_id) {
            ferry.color = route.color.to_string();
        }
    }
    ferry
}

/// Poll and draw forever.
pub async fn operate<F, C, R>(
    config: &PortalConfig,
    calculator: &DepartureCalculator<F, C>,
    ferry: &FerrySettings,
    display: &mut DisplayController<R>,
) where
    F: TransitFeed,
    C: SettableClock,
    R: Renderer,
{
    if let Err(e) = display.set_boat_color(ferry.color_or_default()) {
        warn!("Boat glyph for '{}' unavailable: {}", ferry.color_or_default(), e);
    }
    info!(
        "Showing departures for '{}' at {} ({})",
        ferry.headsign, ferry.stop_name, ferry.route_name
    );

    loop {
        let wait = poll_once(config, calculator, ferry, display).await;
        sleep(wait).await;
    }
}

/// Configure, go online, then operate.
pub async fn run<S, W, F, C, R>(
    config: &PortalConfig,
    routes: RouteTable,
    store: &S,
    radio: &W,
    calculator: &DepartureCalculator<F, C>,
    display: &mut DisplayController<R>,
) -> Result<(), PortalError>
where
    S: SettingsStore,
    W: WifiRadio,
    F: TransitFeed,
    C: SettableClock,
    R: Renderer,
{
    let ferry = configure(config, routes, store, radio, display).await?;
    let ferry = with_catalog_color(&routes, ferry);
    operate(config, calculator, &ferry, display).await;
    Ok(())
}
