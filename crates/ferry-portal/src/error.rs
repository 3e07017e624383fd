//! Portal errors.

use ferry_core::SettingsError;
use thiserror::Error;

use crate::wifi::RadioError;

/// Errors that end the portal or the device lifecycle.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),

    /// Setup finished but the sign cannot go online.
    #[error("Halted: {0}")]
    Halted(&'static str),
}
