//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML node
//! configuration and the records embedded in it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rtc_common::config::{ConfigLoader, ConfigError, NodeConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = NodeConfig::load(Path::new("node.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::schema::action::AutomationConfig;
use crate::schema::i2c::I2cBusConfig;
use crate::schema::id::IdError;
use crate::schema::rx8025::{Rx8025Config, TimePlatformConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading, validation and generation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML syntax is invalid or the file could not be read.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A record has a missing, malformed or out-of-range field.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// An id could not be declared or resolved.
    #[error("Invalid reference: {0}")]
    Reference(#[from] IdError),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Equivalent `tracing` level.
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields of a node.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "clock-node-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete node configuration as read from `node.toml`.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "clock-node"
///
/// [[i2c]]
/// id = "bus_a"
/// device = "/dev/i2c-1"
///
/// [[time]]
/// platform = "rx8025"
/// id = "rtc"
/// "battery1.5v" = true
///
/// [[automation]]
/// trigger = "boot"
/// then = [{ "rx8025.read_time" = "rtc" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Shared service settings.
    pub shared: SharedConfig,

    /// Declared I2C buses.
    #[serde(default)]
    pub i2c: Vec<I2cBusConfig>,

    /// Time platforms, selected by their `platform` key.
    #[serde(default)]
    pub time: Vec<TimePlatformConfig>,

    /// Automations running actions on boot or periodically.
    #[serde(default)]
    pub automation: Vec<AutomationConfig>,
}

impl NodeConfig {
    /// Iterate all RX8025 entries in declaration order.
    pub fn rx8025s(&self) -> impl Iterator<Item = &Rx8025Config> {
        self.time.iter().map(|platform| match platform {
            TimePlatformConfig::Rx8025(rtc) => rtc,
        })
    }

    /// Validate every record field by field.
    ///
    /// Identifier references are checked during generation, see
    /// [`crate::codegen::validate_config`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` on the first rejected record.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        for bus in &self.i2c {
            bus.validate()?;
        }

        for rtc in self.rx8025s() {
            rtc.validate()?;
        }

        if !self.time.is_empty() && self.i2c.is_empty() {
            return Err(ConfigError::ValidationError(
                "Component rx8025 requires component i2c".to_string(),
            ));
        }

        for automation in &self.automation {
            automation.validate()?;
        }

        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Returns `ConfigError::ValidationError` if the document does not match
///   the schema (unknown keys, wrong types, bad values)
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// Syntax is checked first so that schema mismatches surface as
    /// validation errors rather than parse errors.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ValidationError(e.to_string()))
    }
}

// Any serde-deserializable struct can be loaded from TOML.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
