//! Epson RX8025 real-time clock.
//!
//! The chip keeps time in BCD registers 0x0-0x6 and its status in the two
//! control registers 0xE and 0xF. The driver always transfers the full
//! 16-byte register file starting at register 0.

mod component;
mod registers;

pub use component::Rx8025Component;
pub use registers::{
    CalendarTime, Control1, Control2, REGISTER_COUNT, RegisterBlock, bcd_decode, bcd_encode,
};

use crate::clock::WallClock;
use crate::driver::RtcDriver;
use std::sync::Arc;

/// Factory function to create an RX8025 driver instance.
pub fn create_driver(id: &str, wall: Arc<dyn WallClock>) -> Box<dyn RtcDriver> {
    Box::new(Rx8025Component::new(id, wall))
}
