//! # RTC HAL Library
//!
//! RX8025 real-time clock driver and the node runtime that executes
//! generated code.
//!
//! # Module Structure
//!
//! - [`bus`] - I2C buses (Linux i2c-dev, simulation) and shared handles
//! - [`clock`] - Wall clock sources and the synchronized time of a provider
//! - [`core`] - NodeCore: interprets statements, runs setup and the loop
//! - [`driver`] - `RtcDriver` trait and I2C device handle
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//! - [`error`] - HAL and RTC error types
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          rtc_hal                                 │
//! │  ┌──────────────┐    ┌──────────────┐    ┌───────────────────┐   │
//! │  │ GeneratedCode│───►│  NodeCore    │◄──►│  Driver Registry  │   │
//! │  │ (rtc_common) │    │ (setup/tick) │    │                   │   │
//! │  └──────────────┘    └──────┬───────┘    └───────────────────┘   │
//! │                             │                                    │
//! │                             ▼                                    │
//! │                   ┌────────────────┐      ┌────────────────┐     │
//! │                   │  RtcDriver     │─────►│  SharedBus     │     │
//! │                   │  (rx8025)      │      │  (I2C)         │     │
//! │                   └────────────────┘      └────────────────┘     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod bus;
pub mod clock;
pub mod core;
pub mod driver;
pub mod driver_registry;
pub mod drivers;
pub mod error;

// Re-export key types for convenience
pub use crate::core::NodeCore;
pub use crate::driver_registry::DriverRegistry;
pub use crate::error::{HalError, RtcError};
