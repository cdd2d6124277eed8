//! RTC Common Library
//!
//! This crate provides the configuration schema, identifier resolution and
//! code generation shared by the RTC node workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and the node configuration
//! - [`schema`] - Per-record schemas (I2C bus, RX8025, automations, actions)
//! - [`codegen`] - Statement generation from a validated configuration
//! - [`consts`] - Class names, action names and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use rtc_common::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = NodeConfig::load(Path::new("node.toml"))?;
//!     let code = generate(&config)?;
//!     print!("{code}");
//!     Ok(())
//! }
//! ```

pub mod codegen;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod schema;
