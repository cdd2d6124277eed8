//! Class names, action names and schema defaults.

use std::time::Duration;

/// Platform key selecting the RX8025 driver in a `[[time]]` entry.
pub const RX8025_PLATFORM: &str = "rx8025";

/// Driver class instantiated for every RX8025 entry.
pub const RX8025_COMPONENT_CLASS: &str = "rx8025::RX8025Component";

/// Action class bound by `rx8025.write_time`.
pub const RX8025_WRITE_ACTION_CLASS: &str = "rx8025::WriteAction";

/// Action class bound by `rx8025.read_time`.
pub const RX8025_READ_ACTION_CLASS: &str = "rx8025::ReadAction";

/// Action name writing the system time to the RTC.
pub const WRITE_TIME_ACTION: &str = "rx8025.write_time";

/// Action name reading the RTC into the system time.
pub const READ_TIME_ACTION: &str = "rx8025.read_time";

/// Class of declared I2C buses.
pub const I2C_BUS_CLASS: &str = "i2c::I2CBus";

/// Class of declared automations.
pub const AUTOMATION_CLASS: &str = "Automation";

/// Default I2C address of the RX8025 (7-bit).
pub const DEFAULT_RX8025_ADDRESS: u8 = 0x64;

/// Highest valid 7-bit I2C address.
pub const MAX_I2C_ADDRESS: u8 = 0x7F;

/// Default i2c-dev character device.
pub const DEFAULT_I2C_DEVICE: &str = "/dev/i2c-1";

/// Default POSIX timezone.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Default polling period of time components (15 minutes).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Times before this year are treated as "never set".
pub const MIN_VALID_YEAR: i32 = 2019;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rtc/node.toml";
