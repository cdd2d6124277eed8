//! RX8025 time platform schema.
//!
//! Combines the time schema (`timezone`, `update_interval`), the I2C
//! device schema (`address`, `i2c_id`) and the RX8025 specific
//! `battery1.5v` flag.

use crate::config::ConfigError;
use crate::consts::{DEFAULT_RX8025_ADDRESS, DEFAULT_TIMEZONE, DEFAULT_UPDATE_INTERVAL};
use crate::schema::i2c::validate_i2c_address;
use crate::schema::period::TimePeriod;
use serde::{Deserialize, Serialize};

fn default_address() -> u8 {
    DEFAULT_RX8025_ADDRESS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_update_interval() -> TimePeriod {
    TimePeriod::Every(DEFAULT_UPDATE_INTERVAL)
}

/// A `[[time]]` entry, selected by its `platform` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum TimePlatformConfig {
    /// `platform = "rx8025"`
    Rx8025(Rx8025Config),
}

/// RX8025 real-time clock.
///
/// # TOML Example
///
/// ```toml
/// [[time]]
/// platform = "rx8025"
/// id = "rtc"
/// address = 0x64
/// "battery1.5v" = true
/// timezone = "CET-1CEST,M3.5.0,M10.5.0/3"
/// update_interval = "15min"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rx8025Config {
    /// Component id; generated when omitted.
    #[serde(default)]
    pub id: Option<String>,

    /// Battery backup with a 1.5 V cell: selects the 1.3 V voltage-drop
    /// threshold instead of 2.1 V.
    #[serde(rename = "battery1.5v", default)]
    pub battery_1v5: bool,

    /// 7-bit I2C address.
    #[serde(default = "default_address")]
    pub address: u8,

    /// Bus id; defaults to the sole declared bus.
    #[serde(default)]
    pub i2c_id: Option<String>,

    /// POSIX TZ string.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Polling period of the clock.
    #[serde(default = "default_update_interval")]
    pub update_interval: TimePeriod,
}

impl Default for Rx8025Config {
    fn default() -> Self {
        Self {
            id: None,
            battery_1v5: false,
            address: default_address(),
            i2c_id: None,
            timezone: default_timezone(),
            update_interval: default_update_interval(),
        }
    }
}

impl Rx8025Config {
    /// Validate the fields inherited from the I2C device and time schemas.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_i2c_address(self.address)?;
        validate_timezone(&self.timezone)?;
        Ok(())
    }
}

/// Check a POSIX TZ string: non-empty printable ASCII without whitespace.
pub fn validate_timezone(timezone: &str) -> Result<(), ConfigError> {
    if timezone.is_empty() {
        return Err(ConfigError::ValidationError(
            "timezone cannot be empty".to_string(),
        ));
    }
    if !timezone.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ConfigError::ValidationError(format!(
            "timezone '{timezone}' must be a POSIX TZ string without whitespace"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Rx8025Config, toml::de::Error> {
        toml::from_str(toml_str)
    }

    #[test]
    fn defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Rx8025Config::default());
        assert!(!config.battery_1v5);
        assert_eq!(config.address, 0x64);
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.update_interval.as_millis(), Some(900_000));
    }

    #[test]
    fn battery_key_contains_a_dot() {
        let config = parse("\"battery1.5v\" = true").unwrap();
        assert!(config.battery_1v5);
    }

    #[test]
    fn battery_must_be_boolean() {
        assert!(parse("\"battery1.5v\" = 1").is_err());
        assert!(parse("\"battery1.5v\" = \"yes\"").is_err());
    }

    #[test]
    fn address_override_and_range() {
        let config = parse("address = 0x32").unwrap();
        assert_eq!(config.address, 0x32);
        assert!(config.validate().is_ok());

        let config = parse("address = 0x90").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        assert!(parse("address = 0x164").is_err());
    }

    #[test]
    fn timezone_validation() {
        assert!(validate_timezone("CET-1CEST,M3.5.0,M10.5.0/3").is_ok());
        assert!(validate_timezone("").is_err());
        assert!(validate_timezone("Europe/Berlin time").is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(parse("battery = true").is_err());
    }
}
