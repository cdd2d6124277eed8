//! RTC driver trait and the I2C device handle.
//!
//! This module defines:
//! - `RtcDriver` trait - Interface for pluggable real-time clock components
//! - `I2cDevice` struct - A device address on a shared bus
//! - `DriverFactory` type alias - Factory function type
//! - `setup_priority` - Ordering constants for component setup

use crate::bus::{BusError, SharedBus};
use crate::clock::WallClock;
use crate::error::RtcError;
use chrono::{DateTime, Utc};
use embedded_hal::i2c::I2c;
use std::sync::Arc;

/// Setup priorities. Higher values are set up first.
pub mod setup_priority {
    /// Components that read data from hardware.
    pub const DATA: f32 = 600.0;
}

/// One device on a shared I2C bus.
#[derive(Debug, Clone)]
pub struct I2cDevice {
    bus_id: String,
    bus: SharedBus,
    address: u8,
}

impl I2cDevice {
    /// Device at `address` on bus `bus_id`.
    pub fn new(bus_id: &str, bus: SharedBus, address: u8) -> Self {
        Self {
            bus_id: bus_id.to_string(),
            bus,
            address,
        }
    }

    /// Id of the bus the device sits on.
    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    /// 7-bit address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read `buf.len()` registers starting at `register`.
    pub fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.bus.write_read(self.address, &[register], buf)
    }

    /// Write `data` to consecutive registers starting at `register`.
    pub fn write_bytes(&mut self, register: u8, data: &[u8]) -> Result<(), BusError> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        self.bus.write(self.address, &frame)
    }
}

/// Factory function type for creating driver instances.
///
/// Receives the variable id of the new instance and the wall clock its
/// time provider reads.
pub type DriverFactory = fn(&str, Arc<dyn WallClock>) -> Box<dyn RtcDriver>;

/// Trait defining the interface for real-time clock components.
///
/// `NodeCore` manages drivers through this trait.
///
/// # Lifecycle
///
/// 1. Configuration calls (`set_vdsl`, `attach_i2c`, `set_timezone`)
///    issued while generated code is interpreted
/// 2. `setup()` - Called once, in descending `setup_priority()` order
/// 3. `dump_config()` - Called once after every component is set up
/// 4. `update()` - Called every update interval unless the component failed
pub trait RtcDriver: Send {
    /// Class name the driver is registered under.
    fn class(&self) -> &'static str;

    /// Variable id of this instance.
    fn id(&self) -> &str;

    /// Initialize the hardware.
    ///
    /// # Errors
    /// A driver that cannot reach its hardware marks itself failed and
    /// returns the cause.
    fn setup(&mut self) -> Result<(), RtcError>;

    /// Periodic poll.
    fn update(&mut self) -> Result<(), RtcError>;

    /// Log the effective configuration.
    fn dump_config(&self);

    /// Setup ordering, higher first.
    fn setup_priority(&self) -> f32 {
        setup_priority::DATA
    }

    /// Whether the component gave up on its hardware.
    fn is_failed(&self) -> bool;

    /// Stop updating this component.
    fn mark_failed(&mut self);

    /// Battery backup switchover threshold: `true` selects 1.3 V, `false` 2.1 V.
    fn set_vdsl(&mut self, battery_backup: bool);

    /// Current battery backup flag.
    fn battery_backup(&self) -> bool;

    /// Attach the I2C device the driver talks to.
    fn attach_i2c(&mut self, device: I2cDevice);

    /// Set the POSIX TZ string of the time provider.
    fn set_timezone(&mut self, timezone: &str);

    /// Read the hardware clock and synchronize to it.
    fn read_time(&mut self) -> Result<DateTime<Utc>, RtcError>;

    /// Write the current time to the hardware clock.
    fn write_time(&mut self) -> Result<(), RtcError>;

    /// Synchronized time, `None` before the first successful read.
    fn now(&self) -> Option<DateTime<Utc>>;
}
