//! Departure calculator.
//!
//! Wraps a [`TransitFeed`] and a clock. Every failure is logged and
//! collapses to "no departure"; callers never see a transit error.

use ferry_core::departure::{
    clock_is_valid, minutes_until, select_next_departure, within_service_hours,
};
use ferry_core::DepartureEstimate;
use tracing::{debug, info, warn};

use crate::clock::SettableClock;
use crate::error::TransitError;
use crate::transitland::TransitFeed;

/// Computes the next matching departure for a configured stop.
pub struct DepartureCalculator<F, C> {
    feed: F,
    clock: C,
}

impl<F: TransitFeed, C: SettableClock> DepartureCalculator<F, C> {
    pub fn new(feed: F, clock: C) -> Self {
        Self { feed, clock }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Next departure at `stop_id` for this headsign and route, or `None`
    /// outside service hours, when nothing matches, or on any failure.
    pub async fn fetch_next_departure(
        &self,
        stop_id: &str,
        headsign: &str,
        route_id: &str,
    ) -> Option<DepartureEstimate> {
        match self.try_fetch(stop_id, headsign, route_id).await {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!("Departure fetch for {} failed: {}", stop_id, e);
                None
            }
        }
    }

    /// Minutes until the next departure, as the display wants it.
    pub async fn minutes_to_next_departure(
        &self,
        stop_id: &str,
        headsign: &str,
        route_id: &str,
    ) -> Option<i64> {
        let estimate = self.fetch_next_departure(stop_id, headsign, route_id).await;
        minutes_until(estimate.as_ref(), self.clock.now())
    }

    /// Set the clock from network time.
    pub async fn sync_clock(&self) -> Result<(), TransitError> {
        let now = self.feed.network_time().await?;
        self.clock.set_now(now);
        info!("Clock synced to {}", now);
        Ok(())
    }

    async fn try_fetch(
        &self,
        stop_id: &str,
        headsign: &str,
        route_id: &str,
    ) -> Result<Option<DepartureEstimate>, TransitError> {
        if !clock_is_valid(self.clock.now()) {
            debug!("Clock not set ({}), syncing", self.clock.now());
            if let Err(e) = self.sync_clock().await {
                warn!("Clock sync failed: {}", e);
            }
        }

        let now = self.clock.now();
        if !within_service_hours(now) {
            debug!("Outside service hours at {}, skipping request", now.time());
            return Ok(None);
        }

        let departures = self.feed.departures(stop_id).await?;
        let next = select_next_departure(&departures, headsign, route_id);
        match &next {
            Some(estimate) => debug!(
                "Next {} departure: scheduled {:?}, estimated {:?}",
                headsign, estimate.scheduled, estimate.estimated
            ),
            None => debug!(
                "No departures for '{}' on {} among {}",
                headsign,
                route_id,
                departures.len()
            ),
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{NaiveDate, NaiveDateTime};
    use ferry_core::{Clock, Departure};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ROUTE: &str = "r-dr5ru-as";
    const HEADSIGN: &str = "Wall St./Pier 11";

    fn at(y: i32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[derive(Default)]
    struct FakeFeed {
        departures: Vec<Departure>,
        fail: bool,
        time: Option<NaiveDateTime>,
        departure_calls: AtomicUsize,
        time_calls: AtomicUsize,
    }

    impl TransitFeed for FakeFeed {
        async fn departures(&self, _stop_id: &str) -> Result<Vec<Departure>, TransitError> {
            self.departure_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TransitError::Status(503))
            } else {
                Ok(self.departures.clone())
            }
        }

        async fn network_time(&self) -> Result<NaiveDateTime, TransitError> {
            self.time_calls.fetch_add(1, Ordering::SeqCst);
            self.time
                .ok_or_else(|| TransitError::ClockSync("offline".to_string()))
        }
    }

    fn dep(headsign: &str, scheduled: &str, estimated: &str) -> Departure {
        Departure {
            trip_headsign: headsign.to_string(),
            route_id: ROUTE.to_string(),
            scheduled: Some(scheduled.to_string()),
            estimated: Some(estimated.to_string()),
        }
    }

    fn feed_with(departures: Vec<Departure>) -> FakeFeed {
        FakeFeed {
            departures,
            ..FakeFeed::default()
        }
    }

    #[tokio::test]
    async fn test_picks_earliest_matching() {
        let feed = feed_with(vec![
            dep(HEADSIGN, "12:40:00", "12:41:00"),
            dep("Astoria", "12:05:00", "12:05:00"),
            dep(HEADSIGN, "12:20:00", "12:22:00"),
        ]);
        let calc = DepartureCalculator::new(feed, ManualClock::new(at(2024, 12, 0)));

        let next = calc.fetch_next_departure("s-x", HEADSIGN, ROUTE).await.unwrap();
        assert_eq!(next.estimated.as_deref(), Some("12:22:00"));
        assert_eq!(calc.minutes_to_next_departure("s-x", HEADSIGN, ROUTE).await, Some(23));
    }

    #[tokio::test]
    async fn test_service_hours_gate_skips_request() {
        let feed = feed_with(vec![dep(HEADSIGN, "23:30:00", "23:30:00")]);
        for hour in [23, 0, 4] {
            let calc = DepartureCalculator::new(&feed, ManualClock::new(at(2024, hour, 15)));
            assert_eq!(calc.fetch_next_departure("s-x", HEADSIGN, ROUTE).await, None);
        }
        assert_eq!(feed.departure_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_feed_failure_is_none() {
        let feed = FakeFeed {
            fail: true,
            ..FakeFeed::default()
        };
        let calc = DepartureCalculator::new(feed, ManualClock::new(at(2024, 9, 0)));
        assert_eq!(calc.fetch_next_departure("s-x", HEADSIGN, ROUTE).await, None);
        assert_eq!(calc.minutes_to_next_departure("s-x", HEADSIGN, ROUTE).await, None);
    }

    #[tokio::test]
    async fn test_invalid_clock_triggers_sync() {
        let mut feed = feed_with(vec![dep(HEADSIGN, "10:10:00", "10:10:00")]);
        feed.time = Some(at(2024, 10, 0));
        let calc = DepartureCalculator::new(feed, ManualClock::new(at(2000, 10, 0)));

        let minutes = calc.minutes_to_next_departure("s-x", HEADSIGN, ROUTE).await;
        assert_eq!(minutes, Some(11));
        assert_eq!(calc.feed().time_calls.load(Ordering::SeqCst), 1);
        assert_eq!(calc.clock().now(), at(2024, 10, 0));
    }

    #[tokio::test]
    async fn test_sync_failure_is_not_fatal() {
        let feed = feed_with(vec![dep(HEADSIGN, "10:10:00", "10:12:00")]);
        let calc = DepartureCalculator::new(feed, ManualClock::new(at(2000, 10, 0)));

        let next = calc.fetch_next_departure("s-x", HEADSIGN, ROUTE).await;
        assert_eq!(next.and_then(|e| e.estimated), Some("10:12:00".to_string()));
        assert_eq!(calc.feed().time_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_valid_clock_does_not_sync() {
        let calc = DepartureCalculator::new(feed_with(vec![]), ManualClock::new(at(2024, 10, 0)));
        assert_eq!(calc.fetch_next_departure("s-x", HEADSIGN, ROUTE).await, None);
        assert_eq!(calc.feed().time_calls.load(Ordering::SeqCst), 0);
    }
}
