//! Transit provider errors.

use thiserror::Error;

/// Errors from the transit and time APIs.
#[derive(Debug, Error)]
pub enum TransitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("No stop information in response")]
    NoStop,

    #[error("Clock sync failed: {0}")]
    ClockSync(String),
}
