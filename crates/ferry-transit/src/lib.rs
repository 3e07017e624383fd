//! # ferry-transit
//!
//! Departure data for the ferry sign.
//!
//! - [`TransitlandClient`]: the Transitland REST departures endpoint and a
//!   network time source, both over `reqwest`
//! - [`SystemClock`]: host time with a correction offset set by a sync
//! - [`DepartureCalculator`]: clock check, service-hours gate, query and
//!   next-departure selection, collapsing every failure to `None`

pub mod calculator;
pub mod clock;
pub mod config;
pub mod error;
pub mod transitland;

pub use calculator::DepartureCalculator;
pub use clock::{ManualClock, SettableClock, SystemClock};
pub use config::TransitConfig;
pub use error::TransitError;
pub use transitland::{TransitFeed, TransitlandClient};
