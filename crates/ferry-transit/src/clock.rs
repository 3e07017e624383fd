//! Wall clock with network correction.
//!
//! The sign may boot with no idea what time it is. [`SystemClock`] keeps a
//! signed offset on top of host local time that a successful time-API sync
//! adjusts, so `now()` reads the fetched wall time from then on.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::{Duration, Local, NaiveDateTime};
use ferry_core::Clock;

/// A clock that can be set to a known wall time.
pub trait SettableClock: Clock {
    fn set_now(&self, now: NaiveDateTime);
}

/// Host local time plus a correction offset.
#[derive(Debug, Default)]
pub struct SystemClock {
    offset_secs: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> Duration {
        Duration::seconds(self.offset_secs.load(Ordering::Relaxed))
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local() + self.offset()
    }
}

impl SettableClock for SystemClock {
    fn set_now(&self, now: NaiveDateTime) {
        let offset = now - Local::now().naive_local();
        self.offset_secs.store(offset.num_seconds(), Ordering::Relaxed);
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl SettableClock for ManualClock {
    fn set_now(&self, now: NaiveDateTime) {
        if let Ok(mut current) = self.now.lock() {
            *current = now;
        }
    }
}

/// Parse the date and time of an ISO-8601 timestamp, ignoring fractional
/// seconds and the UTC offset (`2024-01-15T14:30:45.123456-05:00`).
pub fn parse_wall_time(datetime: &str) -> Option<NaiveDateTime> {
    let head = datetime.get(..19)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").ok()
}
