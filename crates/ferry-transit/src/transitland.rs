//! Transitland departures client.
//!
//! Only the fields the sign needs are modelled. Everything is
//! `#[serde(default)]`, so a departure missing its trip or times still
//! deserializes and simply never matches a filter.

use std::future::Future;

use chrono::NaiveDateTime;
use ferry_core::Departure;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::clock::parse_wall_time;
use crate::config::TransitConfig;
use crate::error::TransitError;

// ============================================================================
// Wire models
// ============================================================================

/// `GET /stops/{id}/departures` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeparturesResponse {
    pub stops: Vec<StopDepartures>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StopDepartures {
    pub departures: Vec<DepartureRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DepartureRecord {
    pub trip: TripInfo,
    pub departure: DepartureTimes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TripInfo {
    pub trip_headsign: Option<String>,
    pub route: RouteRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteRef {
    pub onestop_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DepartureTimes {
    pub scheduled: Option<String>,
    pub estimated: Option<String>,
}

impl From<DepartureRecord> for Departure {
    fn from(record: DepartureRecord) -> Self {
        Departure {
            trip_headsign: record.trip.trip_headsign.unwrap_or_default(),
            route_id: record.trip.route.onestop_id.unwrap_or_default(),
            scheduled: record.departure.scheduled,
            estimated: record.departure.estimated,
        }
    }
}

impl DeparturesResponse {
    /// Departures reported for the first stop in the response.
    pub fn into_departures(self) -> Result<Vec<Departure>, TransitError> {
        let stop = self.stops.into_iter().next().ok_or(TransitError::NoStop)?;
        Ok(stop.departures.into_iter().map(Departure::from).collect())
    }
}

/// Time API response; only the local `datetime` is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorldTimeResponse {
    pub datetime: String,
}

// ============================================================================
// Feed trait
// ============================================================================

/// Source of departures and network time.
pub trait TransitFeed: Send + Sync {
    /// All departures currently reported for a stop, in reported order.
    fn departures(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<Vec<Departure>, TransitError>> + Send;

    /// Current local wall time according to the network.
    fn network_time(&self) -> impl Future<Output = Result<NaiveDateTime, TransitError>> + Send;
}

impl<T: TransitFeed> TransitFeed for &T {
    async fn departures(&self, stop_id: &str) -> Result<Vec<Departure>, TransitError> {
        (**self).departures(stop_id).await
    }

    async fn network_time(&self) -> Result<NaiveDateTime, TransitError> {
        (**self).network_time().await
    }
}

// ============================================================================
// HTTP client
// ============================================================================

/// Transitland REST client.
#[derive(Debug, Clone)]
pub struct TransitlandClient {
    client: Client,
    config: TransitConfig,
}

impl TransitlandClient {
    pub fn new(config: TransitConfig) -> Result<Self, TransitError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransitConfig {
        &self.config
    }
}

impl TransitFeed for TransitlandClient {
    async fn departures(&self, stop_id: &str) -> Result<Vec<Departure>, TransitError> {
        debug!("Requesting departures for stop {}", stop_id);
        let response = self
            .client
            .get(self.config.departures_url(stop_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Departures request for {} returned {}", stop_id, status);
            return Err(TransitError::Status(status.as_u16()));
        }

        let body: DeparturesResponse = response.json().await?;
        let departures = body.into_departures()?;
        debug!("Stop {} reported {} departures", stop_id, departures.len());
        Ok(departures)
    }

    async fn network_time(&self) -> Result<NaiveDateTime, TransitError> {
        let response = self.client.get(&self.config.time_api_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransitError::Status(status.as_u16()));
        }

        let body: WorldTimeResponse = response.json().await?;
        parse_wall_time(&body.datetime)
            .ok_or_else(|| TransitError::ClockSync(format!("unparsable datetime {:?}", body.datetime)))
    }
}
