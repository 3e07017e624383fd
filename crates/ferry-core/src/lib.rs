//! # ferry-core
//!
//! Core domain for the ferry countdown sign.
//!
//! This crate provides:
//! - The static NYC Ferry route catalog
//! - Settings model and persistence (`settings.toml`, `secrets.toml`)
//! - Departure arithmetic (service hours, next-departure selection, minutes remaining)
//! - The display mode controller and the `Renderer` seam
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! so the same logic runs on the device and on a Linux host.

pub mod departure;
pub mod display;
pub mod routes;
pub mod settings;

pub use departure::{Clock, Departure, DepartureEstimate};
pub use display::{DisplayController, DisplayMode, DrawCommand, Geometry, Point, RenderError, Renderer};
pub use routes::{RouteEntry, RouteTable, StopEntry};
pub use settings::{
    FerrySettings, FileSettingsStore, MemorySettingsStore, PendingConfig, SettingsError,
    SettingsStore, StoredSettings, WifiCredentials,
};
