//! Departure arithmetic.
//!
//! Pure functions behind the departure calculator: the operating-hours gate,
//! next-departure selection, and the minutes-remaining computation with day
//! rollover. Nothing here performs I/O; "now" is always passed in.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

/// First local hour boats run (inclusive).
pub const SERVICE_START_HOUR: u32 = 5;

/// Local hour boats stop running (exclusive).
pub const SERVICE_END_HOUR: u32 = 23;

/// Clocks reporting a year before this have not been set.
pub const MIN_VALID_YEAR: i32 = 2020;

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// Boats run between 05:00 and 23:00 local.
pub fn within_service_hours(now: NaiveDateTime) -> bool {
    (SERVICE_START_HOUR..SERVICE_END_HOUR).contains(&now.hour())
}

/// The clock has been set to something plausible.
pub fn clock_is_valid(now: NaiveDateTime) -> bool {
    now.year() >= MIN_VALID_YEAR
}

/// One departure reported for a stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Departure {
    pub trip_headsign: String,
    /// Full Onestop route id.
    pub route_id: String,
    /// Scheduled time of day, `HH:MM:SS`.
    pub scheduled: Option<String>,
    /// Real-time estimate, `HH:MM:SS`.
    pub estimated: Option<String>,
}

/// The departure chosen as "next".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureEstimate {
    pub scheduled: Option<String>,
    pub estimated: Option<String>,
}

impl DepartureEstimate {
    /// Estimated time, falling back to the schedule.
    pub fn departure_time(&self) -> Option<&str> {
        self.estimated
            .as_deref()
            .or(self.scheduled.as_deref())
    }
}

/// Pick the earliest scheduled departure matching headsign and route.
///
/// Ties keep the order they were reported in. Departures without a parsable
/// scheduled time sort after all others.
pub fn select_next_departure<'a, I>(
    departures: I,
    headsign: &str,
    route_id: &str,
) -> Option<DepartureEstimate>
where
    I: IntoIterator<Item = &'a Departure>,
{
    departures
        .into_iter()
        .filter(|d| d.trip_headsign == headsign && d.route_id == route_id)
        .min_by_key(|d| {
            let secs = d.scheduled.as_deref().and_then(parse_time_of_day);
            (secs.is_none(), secs.map(|t| t.num_seconds_from_midnight()))
        })
        .map(|d| DepartureEstimate {
            scheduled: d.scheduled.clone(),
            estimated: d.estimated.clone(),
        })
}

/// Parse `HH:MM:SS` (or `HH:MM`) as a 24-hour time of day.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let mut parts = text.trim().split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Minutes until a departure at `time_of_day`.
///
/// A time earlier than `now` is taken to mean tomorrow. The result is
/// `floor(seconds / 60) + 1`, so a boat 30 seconds out reads 1 minute.
pub fn time_to_next_departure(time_of_day: &str, now: NaiveDateTime) -> Option<i64> {
    let time = parse_time_of_day(time_of_day)?;
    // Departure times carry whole seconds only.
    let now = now.with_nanosecond(0)?;
    let mut departure = now.date().and_time(time);
    if departure < now {
        departure += Duration::days(1);
    }
    let seconds = (departure - now).num_seconds();
    Some(seconds.div_euclid(60) + 1)
}

/// Minutes until the estimate's departure time, if any.
pub fn minutes_until(estimate: Option<&DepartureEstimate>, now: NaiveDateTime) -> Option<i64> {
    estimate
        .and_then(DepartureEstimate::departure_time)
        .and_then(|t| time_to_next_departure(t, now))
}
