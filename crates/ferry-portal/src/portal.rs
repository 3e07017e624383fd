//! Two-phase configuration state machine.
//!
//! `WifiConfig` collects home network credentials, `FerryConfig` collects the
//! route, stop and direction. Each request yields a [`PortalReply`]: the page
//! to send back plus an explicit [`Transition`] for the server loop.

use ferry_core::{
    FerrySettings, PendingConfig, RouteTable, SettingsStore, StoredSettings, WifiCredentials,
};
use ferry_protocol::{HttpRequest, HttpResponse};
use tracing::{debug, info, warn};

use crate::pages;
use crate::wifi::{join_and_verify, select_networks, WifiRadio};

/// Form fields.
pub const FIELD_WIFI_NAME: &str = "wifi_name";
pub const FIELD_WIFI_PASSWORD: &str = "wifi_password";
pub const FIELD_ROUTE: &str = "route";
pub const FIELD_STOP: &str = "stop_id";
pub const FIELD_HEADSIGN: &str = "headsign";

/// Which form the portal is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    WifiConfig,
    FerryConfig,
}

impl PortalState {
    /// WiFi setup unless complete credentials are stored. Stored ferry
    /// settings never skip the ferry form.
    pub fn initial(stored: &StoredSettings) -> Self {
        match stored.wifi_credentials() {
            Some(wifi) if wifi.is_complete() => PortalState::FerryConfig,
            _ => PortalState::WifiConfig,
        }
    }
}

/// What the server loop should do after sending a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep serving the same phase.
    Stay,
    /// WiFi credentials were verified and stored.
    EnterFerryConfig,
    /// Ferry settings were stored; setup is done.
    Complete,
}

/// A page plus the transition it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalReply {
    pub response: HttpResponse,
    pub transition: Transition,
}

impl PortalReply {
    fn stay(body: String) -> Self {
        Self {
            response: HttpResponse::html(body),
            transition: Transition::Stay,
        }
    }

    fn with(body: String, transition: Transition) -> Self {
        Self {
            response: HttpResponse::html(body),
            transition,
        }
    }
}

/// The configuration portal.
pub struct Portal<'a, S, W> {
    state: PortalState,
    routes: RouteTable,
    store: &'a S,
    radio: &'a W,
    pending: PendingConfig,
}

impl<'a, S: SettingsStore, W: WifiRadio> Portal<'a, S, W> {
    /// Start in the phase the stored settings call for.
    pub fn new(routes: RouteTable, store: &'a S, radio: &'a W) -> Self {
        let stored = store.load_or_default();
        let state = PortalState::initial(&stored);
        Self::with_state(state, routes, store, radio, PendingConfig::from_stored(&stored))
    }

    pub fn with_state(
        state: PortalState,
        routes: RouteTable,
        store: &'a S,
        radio: &'a W,
        pending: PendingConfig,
    ) -> Self {
        info!("Portal starting in {:?}", state);
        Self {
            state,
            routes,
            store,
            radio,
            pending,
        }
    }

    pub fn state(&self) -> PortalState {
        self.state
    }

    pub fn pending(&self) -> &PendingConfig {
        &self.pending
    }

    /// Dispatch one request to the active phase.
    pub async fn handle(&mut self, request: &HttpRequest) -> PortalReply {
        debug!(
            "{:?} {:?} {} in {:?}",
            request.method, request.path, request.form_params.len(), self.state
        );
        match (self.state, request.is_post()) {
            (PortalState::WifiConfig, false) => self.wifi_form().await,
            (PortalState::WifiConfig, true) => self.submit_wifi(request).await,
            (PortalState::FerryConfig, false) => self.ferry_form(request.query(FIELD_ROUTE)),
            (PortalState::FerryConfig, true) => self.submit_ferry(request),
        }
    }

    // ========================================================================
    // WiFi phase
    // ========================================================================

    async fn wifi_form(&self) -> PortalReply {
        let scan = match self.radio.scan().await {
            Ok(scan) => scan,
            Err(e) => {
                warn!("WiFi scan failed: {}", e);
                Vec::new()
            }
        };
        let networks = select_networks(scan);
        debug!("Offering {} networks", networks.len());
        PortalReply::stay(pages::wifi_page(&networks))
    }

    async fn submit_wifi(&mut self, request: &HttpRequest) -> PortalReply {
        let ssid = request.form(FIELD_WIFI_NAME);
        let password = request.form(FIELD_WIFI_PASSWORD);

        if ssid == pages::CUSTOM_NETWORK {
            return PortalReply::stay(pages::custom_network_page());
        }

        let credentials = WifiCredentials::new(ssid, password);
        if !credentials.is_complete() {
            warn!(
                "Incomplete WiFi form (ssid len {}, password len {})",
                ssid.len(),
                password.len()
            );
            return PortalReply::stay(pages::wifi_error_page());
        }

        info!("Joining '{}'", ssid);
        if let Err(e) = join_and_verify(self.radio, ssid, password).await {
            warn!("Could not verify '{}': {}", ssid, e);
            return PortalReply::stay(pages::wifi_error_page());
        }

        if let Err(e) = self.store.save_wifi(&credentials) {
            warn!("Failed to store WiFi credentials: {}", e);
            return PortalReply::stay(pages::wifi_error_page());
        }

        info!("WiFi credentials stored, moving to ferry setup");
        self.pending.wifi = credentials;
        self.state = PortalState::FerryConfig;
        PortalReply::with(
            pages::ferry_page(&self.routes, None),
            Transition::EnterFerryConfig,
        )
    }

    // ========================================================================
    // Ferry phase
    // ========================================================================

    fn ferry_form(&self, selected: Option<&str>) -> PortalReply {
        PortalReply::stay(pages::ferry_page(&self.routes, selected))
    }

    fn submit_ferry(&mut self, request: &HttpRequest) -> PortalReply {
        let code = request.form(FIELD_ROUTE);
        let stop_key = request.form(FIELD_STOP);
        let headsign = request.form(FIELD_HEADSIGN);

        if code.is_empty() || stop_key.is_empty() || headsign.is_empty() {
            warn!(
                "Incomplete ferry form: route '{}', stop '{}', headsign '{}'",
                code, stop_key, headsign
            );
            return PortalReply::stay(pages::ferry_error_page());
        }

        let settings = self.resolve(code, stop_key, headsign);
        info!(
            "Ferry selection: {} -> {} ({}), {} -> {} ({}), headsign '{}', color '{}'",
            code,
            settings.route_id,
            settings.route_name,
            stop_key,
            settings.stop_id,
            settings.stop_name,
            settings.headsign,
            settings.color
        );

        if let Err(e) = self.store.save_ferry(&settings) {
            warn!("Failed to store ferry settings: {}", e);
            return PortalReply::stay(pages::ferry_error_page());
        }

        self.pending.route_code = code.to_string();
        self.pending.ferry = settings;
        info!("Ferry settings stored, setup complete");
        PortalReply::with(pages::ferry_success_page(), Transition::Complete)
    }

    /// Resolve short form values against the catalog. Unknown codes and keys
    /// pass through as ids with empty names.
    pub fn resolve(&self, code: &str, stop_key: &str, headsign: &str) -> FerrySettings {
        let route = self.routes.route(code);
        let stop = route.and_then(|r| r.resolve_stop(stop_key));

        FerrySettings {
            route_id: route.map_or(code, |r| r.full_id).to_string(),
            route_name: route.map(|r| r.display_name()).unwrap_or_default(),
            stop_id: stop.map_or(stop_key, |s| s.full_id).to_string(),
            stop_name: stop.map(|s| s.name).unwrap_or_default().to_string(),
            headsign: headsign.to_string(),
            color: route.map(|r| r.color).unwrap_or_default().to_string(),
        }
    }
}
