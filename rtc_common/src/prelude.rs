//! Prelude module for common re-exports.
//!
//! ```rust
//! use rtc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, NodeConfig, SharedConfig};

// ─── Schema ─────────────────────────────────────────────────────────
pub use crate::schema::action::{ActionConfig, AutomationConfig, TriggerKind};
pub use crate::schema::i2c::I2cBusConfig;
pub use crate::schema::id::{IdError, IdRegistry};
pub use crate::schema::period::TimePeriod;
pub use crate::schema::rx8025::{Rx8025Config, TimePlatformConfig};

// ─── Code generation ────────────────────────────────────────────────
pub use crate::codegen::actions::ActionRegistry;
pub use crate::codegen::statement::{GeneratedCode, Statement, Trigger};
pub use crate::codegen::{generate, generate_with, validate_config};
