//! RX8025 component: setup, polling and time transfer.

use super::registers::{CalendarTime, Control1, Control2, REGISTER_COUNT, RegisterBlock};
use crate::clock::{RealTimeClock, WallClock, is_valid_time};
use crate::driver::{I2cDevice, RtcDriver};
use crate::error::RtcError;
use chrono::{DateTime, Utc};
use rtc_common::consts::RX8025_COMPONENT_CLASS;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// First register of every transfer.
const IMAGE_START: u8 = 0x00;

/// Epson RX8025 time provider.
#[derive(Debug)]
pub struct Rx8025Component {
    id: String,
    device: Option<I2cDevice>,
    clock: RealTimeClock,
    battery_backup: bool,
    registers: RegisterBlock,
    failed: bool,
}

impl Rx8025Component {
    /// Unattached component named `id`.
    pub fn new(id: &str, wall: Arc<dyn WallClock>) -> Self {
        Self {
            id: id.to_string(),
            device: None,
            clock: RealTimeClock::new(wall),
            battery_backup: false,
            registers: RegisterBlock::power_on(),
            failed: false,
        }
    }

    /// Register image of the last transfer.
    pub fn registers(&self) -> &RegisterBlock {
        &self.registers
    }

    /// Time provider state.
    pub fn clock(&self) -> &RealTimeClock {
        &self.clock
    }

    fn read_registers(&mut self) -> Result<(), RtcError> {
        let device = self.device.as_mut().ok_or(RtcError::NotAttached)?;
        let mut image = [0u8; REGISTER_COUNT];
        device.read_bytes(IMAGE_START, &mut image)?;
        self.registers = RegisterBlock::from_bytes(image);
        debug!("RX8025 '{}' read {}", self.id, self.registers);
        Ok(())
    }

    fn write_registers(&mut self, image: RegisterBlock) -> Result<(), RtcError> {
        let device = self.device.as_mut().ok_or(RtcError::NotAttached)?;
        device.write_bytes(IMAGE_START, image.as_bytes())?;
        self.registers = image;
        debug!("RX8025 '{}' wrote {}", self.id, self.registers);
        Ok(())
    }
}

impl RtcDriver for Rx8025Component {
    fn class(&self) -> &'static str {
        RX8025_COMPONENT_CLASS
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn setup(&mut self) -> Result<(), RtcError> {
        info!("Setting up RX8025 '{}'", self.id);
        if let Err(e) = self.read_registers() {
            self.mark_failed();
            return Err(e);
        }
        Ok(())
    }

    fn update(&mut self) -> Result<(), RtcError> {
        self.read_time().map(|_| ())
    }

    fn dump_config(&self) {
        info!("RX8025 '{}':", self.id);
        match &self.device {
            Some(device) => info!(
                "  Address: 0x{:02X} on bus '{}'",
                device.address(),
                device.bus_id()
            ),
            None => info!("  Address: not attached"),
        }
        info!("  Timezone: '{}'", self.clock.timezone());
        info!(
            "  Battery switchover: {}",
            if self.battery_backup { "1.3V" } else { "2.1V" }
        );
        if self.failed {
            error!("Communication with RX8025 '{}' failed!", self.id);
        }
    }

    fn is_failed(&self) -> bool {
        self.failed
    }

    fn mark_failed(&mut self) {
        error!("Component '{}' was marked as failed", self.id);
        self.failed = true;
    }

    fn set_vdsl(&mut self, battery_backup: bool) {
        self.battery_backup = battery_backup;
    }

    fn battery_backup(&self) -> bool {
        self.battery_backup
    }

    fn attach_i2c(&mut self, device: I2cDevice) {
        self.device = Some(device);
    }

    fn set_timezone(&mut self, timezone: &str) {
        self.clock.set_timezone(timezone);
    }

    fn read_time(&mut self) -> Result<DateTime<Utc>, RtcError> {
        self.read_registers()?;

        if self.registers.is_halted() {
            warn!("RTC halted, not syncing to system clock.");
            return Err(RtcError::Halted);
        }
        if self.registers.battery_low() {
            warn!("RTC '{}' battery low", self.id);
        }

        let time = self
            .registers
            .calendar()
            .and_then(|fields| fields.to_datetime())
            .filter(is_valid_time)
            .ok_or_else(|| RtcError::InvalidRtcTime(self.registers.to_string()))?;

        debug!("RX8025 '{}' time {}", self.id, time);
        self.clock.synchronize_epoch(time);
        Ok(time)
    }

    fn write_time(&mut self) -> Result<(), RtcError> {
        let now = self.clock.utcnow();
        let fields = CalendarTime::from_datetime(&now)
            .filter(|_| is_valid_time(&now))
            .ok_or_else(|| {
                RtcError::InvalidSystemTime(now.format("%Y-%m-%d %H:%M:%S").to_string())
            })?;

        let mut image = self.registers;
        image.set_control1((image.control1() | Control1::HOUR_24) - Control1::TEST);
        image.set_calendar(&fields);
        image.clear_offset_test();

        let mut control2 = image.control2() - (Control2::PON | Control2::VDET);
        control2.insert(Control2::XST);
        control2.set(Control2::VDSL, self.battery_backup);
        image.set_control2(control2);

        self.write_registers(image)?;
        info!("Wrote UTC time {} to RX8025 '{}'", fields, self.id);
        Ok(())
    }

    fn now(&self) -> Option<DateTime<Utc>> {
        self.clock.synchronized_now()
    }
}
