//! I2C bus and I2C device schemas.

use crate::config::ConfigError;
use crate::consts::{DEFAULT_I2C_DEVICE, MAX_I2C_ADDRESS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_device() -> PathBuf {
    PathBuf::from(DEFAULT_I2C_DEVICE)
}

/// One `[[i2c]]` bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct I2cBusConfig {
    /// Bus id; generated when omitted.
    #[serde(default)]
    pub id: Option<String>,

    /// i2c-dev character device.
    #[serde(default = "default_device")]
    pub device: PathBuf,
}

impl I2cBusConfig {
    /// Validate the bus record.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "i2c device path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for I2cBusConfig {
    fn default() -> Self {
        Self {
            id: None,
            device: default_device(),
        }
    }
}

/// Check a 7-bit I2C device address.
pub fn validate_i2c_address(address: u8) -> Result<(), ConfigError> {
    if address > MAX_I2C_ADDRESS {
        return Err(ConfigError::ValidationError(format!(
            "I2C address 0x{address:02X} is out of range (max 0x{MAX_I2C_ADDRESS:02X})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_defaults_to_first_adapter() {
        let bus: I2cBusConfig = toml::from_str("").unwrap();
        assert_eq!(bus.id, None);
        assert_eq!(bus.device, PathBuf::from("/dev/i2c-1"));
        assert!(bus.validate().is_ok());
    }

    #[test]
    fn empty_device_rejected() {
        let bus = I2cBusConfig {
            id: Some("bus".to_string()),
            device: PathBuf::new(),
        };
        assert!(matches!(
            bus.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn address_range() {
        assert!(validate_i2c_address(0x00).is_ok());
        assert!(validate_i2c_address(0x7F).is_ok());
        assert!(validate_i2c_address(0x80).is_err());
    }
}
