//! RX8025 register file layout and BCD calendar encoding.

use bitflags::bitflags;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use static_assertions::assert_eq_size;
use std::fmt;

/// Number of registers transferred per read or write.
pub const REGISTER_COUNT: usize = 16;

const REG_SECONDS: usize = 0x0;
const REG_MINUTES: usize = 0x1;
const REG_HOURS: usize = 0x2;
const REG_WEEKDAY: usize = 0x3;
const REG_DAY: usize = 0x4;
const REG_MONTH: usize = 0x5;
const REG_YEAR: usize = 0x6;
const REG_OFFSET: usize = 0x7;
const REG_CONTROL1: usize = 0xE;
const REG_CONTROL2: usize = 0xF;

const SECONDS_MASK: u8 = 0x7F;
const MINUTES_MASK: u8 = 0x7F;
const HOURS_MASK: u8 = 0x3F;
const HOURS_PM: u8 = 0x20;
const WEEKDAY_MASK: u8 = 0x07;
const DAY_MASK: u8 = 0x3F;
const MONTH_MASK: u8 = 0x1F;
const MONTH_CENTURY: u8 = 0x80;
const OFFSET_MASK: u8 = 0x7F;
const OFFSET_TEST: u8 = 0x80;

const FIRST_YEAR: i32 = 2000;
const LAST_YEAR: i32 = 2199;

bitflags! {
    /// Control register 1 (0xE).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control1: u8 {
        /// Periodic interrupt select bit 0.
        const CT0 = 0x01;
        /// Periodic interrupt select bit 1.
        const CT1 = 0x02;
        /// Periodic interrupt select bit 2.
        const CT2 = 0x04;
        /// Factory test mode, must stay 0.
        const TEST = 0x08;
        /// /CLEN2, FOUT enable (active low).
        const CLEN2 = 0x10;
        /// /12,24: set for 24 hour mode.
        const HOUR_24 = 0x20;
        /// Alarm D enable.
        const DALE = 0x40;
        /// Alarm W enable.
        const WALE = 0x80;
    }
}

bitflags! {
    /// Control register 2 (0xF).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control2: u8 {
        /// Alarm D flag.
        const DAFG = 0x01;
        /// Alarm W flag.
        const WAFG = 0x02;
        /// Periodic interrupt flag.
        const CTFG = 0x04;
        /// /CLEN1, FOUT enable (active low).
        const CLEN1 = 0x08;
        /// Power-on reset detected.
        const PON = 0x10;
        /// /XST: cleared by the chip when the oscillator stopped.
        const XST = 0x20;
        /// Supply voltage dropped below the VDSL threshold.
        const VDET = 0x40;
        /// Voltage detection threshold: set 1.3 V, clear 2.1 V.
        const VDSL = 0x80;
    }
}

/// Decode a packed BCD byte, `None` if either digit is above 9.
pub fn bcd_decode(value: u8) -> Option<u8> {
    let (tens, ones) = (value >> 4, value & 0x0F);
    if tens > 9 || ones > 9 {
        return None;
    }
    Some(tens * 10 + ones)
}

/// Encode 0-99 as packed BCD.
pub fn bcd_encode(value: u8) -> u8 {
    debug_assert!(value < 100);
    ((value / 10) << 4) | (value % 10)
}

/// Calendar fields as kept by the chip, hour in 24 hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    /// 0-59.
    pub second: u8,
    /// 0-59.
    pub minute: u8,
    /// 0-23.
    pub hour: u8,
    /// 0-6, Sunday is 0.
    pub weekday: u8,
    /// 1-31.
    pub day: u8,
    /// 1-12.
    pub month: u8,
    /// 2000-2199.
    pub year: u16,
}

impl CalendarTime {
    /// Split a UTC instant into chip fields.
    ///
    /// Returns `None` outside the years the chip can represent.
    pub fn from_datetime(time: &DateTime<Utc>) -> Option<Self> {
        let year = time.year();
        if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
            return None;
        }
        Some(Self {
            second: time.second() as u8,
            minute: time.minute() as u8,
            hour: time.hour() as u8,
            weekday: time.weekday().num_days_from_sunday() as u8,
            day: time.day() as u8,
            month: time.month() as u8,
            year: year as u16,
        })
    }

    /// The UTC instant, `None` if the fields do not form a real date.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(i32::from(self.year), self.month.into(), self.day.into())?
            .and_hms_opt(self.hour.into(), self.minute.into(), self.second.into())
            .map(|naive| naive.and_utc())
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Full RX8025 register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct RegisterBlock([u8; REGISTER_COUNT]);

assert_eq_size!(RegisterBlock, [u8; REGISTER_COUNT]);

impl RegisterBlock {
    /// Wrap raw register contents.
    pub fn from_bytes(bytes: [u8; REGISTER_COUNT]) -> Self {
        Self(bytes)
    }

    /// Raw register contents.
    pub fn as_bytes(&self) -> &[u8; REGISTER_COUNT] {
        &self.0
    }

    /// Contents after first power-up: PON set, oscillator flag clear,
    /// 12 hour mode, 2000-01-01 00:00:00.
    pub fn power_on() -> Self {
        let mut bytes = [0u8; REGISTER_COUNT];
        // 12 AM in 12 hour form
        bytes[REG_HOURS] = 0x12;
        bytes[REG_DAY] = 0x01;
        bytes[REG_MONTH] = 0x01;
        bytes[REG_CONTROL2] = Control2::PON.bits();
        Self(bytes)
    }

    /// Control register 1.
    pub fn control1(&self) -> Control1 {
        Control1::from_bits_retain(self.0[REG_CONTROL1])
    }

    /// Replace control register 1.
    pub fn set_control1(&mut self, value: Control1) {
        self.0[REG_CONTROL1] = value.bits();
    }

    /// Control register 2.
    pub fn control2(&self) -> Control2 {
        Control2::from_bits_retain(self.0[REG_CONTROL2])
    }

    /// Replace control register 2.
    pub fn set_control2(&mut self, value: Control2) {
        self.0[REG_CONTROL2] = value.bits();
    }

    /// Power-on reset seen or oscillator stopped since the last write.
    pub fn is_halted(&self) -> bool {
        let control2 = self.control2();
        control2.contains(Control2::PON) || !control2.contains(Control2::XST)
    }

    /// Supply dropped below the detection threshold.
    pub fn battery_low(&self) -> bool {
        self.control2().contains(Control2::VDET)
    }

    /// Digital offset (bits 0-6 of register 0x7).
    pub fn digital_offset(&self) -> u8 {
        self.0[REG_OFFSET] & OFFSET_MASK
    }

    /// Clear the TEST bit of the offset register.
    pub fn clear_offset_test(&mut self) {
        self.0[REG_OFFSET] &= !OFFSET_TEST;
    }

    /// Decode the calendar registers.
    ///
    /// Returns `None` when a field is not valid BCD or a 12 hour value is
    /// outside 1-12. Ranges are otherwise checked by
    /// [`CalendarTime::to_datetime`].
    pub fn calendar(&self) -> Option<CalendarTime> {
        let b = &self.0;
        let hour_reg = b[REG_HOURS] & HOURS_MASK;
        let hour = if self.control1().contains(Control1::HOUR_24) {
            bcd_decode(hour_reg)?
        } else {
            let hour12 = bcd_decode(hour_reg & !HOURS_PM)?;
            if !(1..=12).contains(&hour12) {
                return None;
            }
            hour12 % 12 + if hour_reg & HOURS_PM != 0 { 12 } else { 0 }
        };
        let century: u16 = if b[REG_MONTH] & MONTH_CENTURY != 0 {
            2100
        } else {
            2000
        };

        Some(CalendarTime {
            second: bcd_decode(b[REG_SECONDS] & SECONDS_MASK)?,
            minute: bcd_decode(b[REG_MINUTES] & MINUTES_MASK)?,
            hour,
            weekday: b[REG_WEEKDAY] & WEEKDAY_MASK,
            day: bcd_decode(b[REG_DAY] & DAY_MASK)?,
            month: bcd_decode(b[REG_MONTH] & MONTH_MASK)?,
            year: century + u16::from(bcd_decode(b[REG_YEAR])?),
        })
    }

    /// Encode `time` into the calendar registers in 24 hour form.
    ///
    /// The caller sets [`Control1::HOUR_24`].
    pub fn set_calendar(&mut self, time: &CalendarTime) {
        let year = time.year.saturating_sub(2000);
        let century = if year >= 100 { MONTH_CENTURY } else { 0 };
        self.0[REG_SECONDS] = bcd_encode(time.second);
        self.0[REG_MINUTES] = bcd_encode(time.minute);
        self.0[REG_HOURS] = bcd_encode(time.hour);
        self.0[REG_WEEKDAY] = time.weekday & WEEKDAY_MASK;
        self.0[REG_DAY] = bcd_encode(time.day);
        self.0[REG_MONTH] = bcd_encode(time.month) | century;
        self.0[REG_YEAR] = bcd_encode((year % 100) as u8);
    }
}

impl Default for RegisterBlock {
    fn default() -> Self {
        Self::power_on()
    }
}

impl fmt::Display for RegisterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x} {:02x}-{:02x}-{:02x} wd={} ctrl1=0x{:02X} ctrl2=0x{:02X}",
            b[REG_HOURS],
            b[REG_MINUTES],
            b[REG_SECONDS],
            b[REG_YEAR],
            b[REG_MONTH],
            b[REG_DAY],
            b[REG_WEEKDAY],
            b[REG_CONTROL1],
            b[REG_CONTROL2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bcd_is_exact_for_two_digits() {
        for value in 0..100u8 {
            assert_eq!(bcd_decode(bcd_encode(value)), Some(value));
        }
        assert_eq!(bcd_encode(59), 0x59);
        assert_eq!(bcd_decode(0x1A), None);
        assert_eq!(bcd_decode(0xA1), None);
    }

    #[test]
    fn power_on_image_is_halted() {
        let block = RegisterBlock::power_on();
        assert!(block.is_halted());
        assert!(!block.battery_low());
        assert_eq!(
            block.calendar().and_then(|c| c.to_datetime()),
            Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn power_on_image_is_midnight_in_12_hour_mode() {
        let block = RegisterBlock::power_on();
        assert!(!block.control1().contains(Control1::HOUR_24));
        let fields = block.calendar().unwrap();
        assert_eq!((fields.hour, fields.minute, fields.second), (0, 0, 0));
        assert_eq!((fields.year, fields.month, fields.day), (2000, 1, 1));
    }

    #[test]
    fn running_oscillator_without_pon_is_not_halted() {
        let mut block = RegisterBlock::power_on();
        block.set_control2(Control2::XST);
        assert!(!block.is_halted());

        block.set_control2(Control2::XST | Control2::PON);
        assert!(block.is_halted());

        block.set_control2(Control2::empty());
        assert!(block.is_halted());
    }

    #[test]
    fn calendar_encodes_24_hour_time() {
        let time = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap();
        let fields = CalendarTime::from_datetime(&time).unwrap();
        assert_eq!(fields.weekday, 4);

        let mut block = RegisterBlock::power_on();
        block.set_control1(Control1::HOUR_24);
        block.set_calendar(&fields);

        assert_eq!(
            &block.as_bytes()[..7],
            &[0x58, 0x59, 0x23, 0x04, 0x29, 0x02, 0x24]
        );
        assert_eq!(block.calendar(), Some(fields));
        assert_eq!(fields.to_datetime(), Some(time));
    }

    #[test]
    fn twelve_hour_mode_decodes_pm() {
        let mut bytes = [0u8; REGISTER_COUNT];
        bytes[REG_HOURS] = HOURS_PM | 0x12;
        bytes[REG_DAY] = 0x01;
        bytes[REG_MONTH] = 0x01;
        bytes[REG_YEAR] = 0x24;
        let block = RegisterBlock::from_bytes(bytes);
        assert_eq!(block.calendar().map(|c| c.hour), Some(12));

        bytes[REG_HOURS] = 0x12;
        assert_eq!(RegisterBlock::from_bytes(bytes).calendar().map(|c| c.hour), Some(0));

        bytes[REG_HOURS] = HOURS_PM | 0x07;
        assert_eq!(RegisterBlock::from_bytes(bytes).calendar().map(|c| c.hour), Some(19));

        bytes[REG_HOURS] = 0x00;
        assert_eq!(RegisterBlock::from_bytes(bytes).calendar(), None);
    }

    #[test]
    fn century_bit_selects_22nd_century() {
        let time = Utc.with_ymd_and_hms(2105, 6, 1, 0, 0, 0).unwrap();
        let fields = CalendarTime::from_datetime(&time).unwrap();
        let mut block = RegisterBlock::power_on();
        block.set_control1(Control1::HOUR_24);
        block.set_calendar(&fields);
        assert_eq!(block.as_bytes()[REG_MONTH], 0x86);
        assert_eq!(block.calendar().map(|c| c.year), Some(2105));
    }

    #[test]
    fn out_of_range_years_rejected() {
        let time = Utc.with_ymd_and_hms(1999, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(CalendarTime::from_datetime(&time), None);
    }

    #[test]
    fn impossible_date_does_not_convert() {
        let fields = CalendarTime {
            second: 0,
            minute: 0,
            hour: 0,
            weekday: 0,
            day: 31,
            month: 2,
            year: 2024,
        };
        assert_eq!(fields.to_datetime(), None);
    }

    #[test]
    fn offset_test_bit_cleared() {
        let mut bytes = [0u8; REGISTER_COUNT];
        bytes[REG_OFFSET] = 0x85;
        let mut block = RegisterBlock::from_bytes(bytes);
        block.clear_offset_test();
        assert_eq!(block.as_bytes()[REG_OFFSET], 0x05);
        assert_eq!(block.digital_offset(), 0x05);
    }

    #[test]
    fn display_shows_raw_fields() {
        let block = RegisterBlock::power_on();
        assert_eq!(
            block.to_string(),
            "12:00:00 00-01-01 wd=0 ctrl1=0x00 ctrl2=0x10"
        );
    }
}
