//! Error types of the HAL crate.

use crate::bus::BusError;
use thiserror::Error;

/// Error types for runtime construction and execution.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Node initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Generated code is inconsistent with the runtime
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// A component failed to perform an action
    #[error("Action failed: {0}")]
    Action(#[from] RtcError),
}

impl From<BusError> for HalError {
    fn from(err: BusError) -> Self {
        Self::CommunicationError(err.to_string())
    }
}

/// Errors of real-time clock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RtcError {
    /// I2C transfer failed.
    #[error("I2C communication failed: {0}")]
    Bus(#[from] BusError),

    /// Power-on reset detected or oscillator stopped.
    #[error("RTC halted, not syncing to system clock")]
    Halted,

    /// Registers hold an impossible or unset calendar time.
    #[error("Invalid RTC time {0}, not syncing to system clock")]
    InvalidRtcTime(String),

    /// The system time was never set.
    #[error("Invalid system time {0}, not syncing to RTC")]
    InvalidSystemTime(String),

    /// No I2C device was attached before use.
    #[error("No I2C device attached")]
    NotAttached,
}
