//! RTC driver implementations.
//!
//! - [`rx8025`] - Epson RX8025 I2C real-time clock
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `RtcDriver` trait from `crate::driver`
//! 3. Register the driver class in [`register_all_drivers`]

pub mod rx8025;

use crate::driver_registry::DriverRegistry;
use rtc_common::consts::RX8025_COMPONENT_CLASS;

/// Register all built-in drivers under their generated-code class names.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register(RX8025_COMPONENT_CLASS, rx8025::create_driver);
}
