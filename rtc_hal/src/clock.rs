//! Wall clocks and synchronized time.
//!
//! A [`WallClock`] is the host's notion of "now". A [`RealTimeClock`]
//! belongs to one time provider: once synchronized from hardware it keeps
//! the offset between the hardware time and the wall clock and reports
//! wall time corrected by that offset.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use rtc_common::consts::{DEFAULT_TIMEZONE, MIN_VALID_YEAR};
use std::sync::Arc;
use tracing::info;

/// Source of the current UTC time.
pub trait WallClock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// The operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A wall clock that only moves when told to.
#[derive(Debug)]
pub struct ManualWallClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualWallClock {
    /// Start at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: std::time::Duration) {
        let by = ChronoDuration::from_std(by).unwrap_or(ChronoDuration::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(by).unwrap_or(*now);
    }
}

impl WallClock for ManualWallClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Whether `time` is a plausible, set time.
pub fn is_valid_time(time: &DateTime<Utc>) -> bool {
    time.year() >= MIN_VALID_YEAR
}

/// Time kept by one time provider.
pub struct RealTimeClock {
    wall: Arc<dyn WallClock>,
    timezone: String,
    offset: Option<ChronoDuration>,
}

impl RealTimeClock {
    /// Unsynchronized clock reading `wall`.
    pub fn new(wall: Arc<dyn WallClock>) -> Self {
        Self {
            wall,
            timezone: DEFAULT_TIMEZONE.to_string(),
            offset: None,
        }
    }

    /// POSIX TZ string.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Set the POSIX TZ string.
    pub fn set_timezone(&mut self, timezone: &str) {
        self.timezone = timezone.to_string();
    }

    /// Current UTC time: wall time, corrected once synchronized.
    pub fn utcnow(&self) -> DateTime<Utc> {
        let now = self.wall.now();
        match self.offset {
            Some(offset) => now.checked_add_signed(offset).unwrap_or(now),
            None => now,
        }
    }

    /// Synchronized time, `None` before the first synchronization.
    pub fn synchronized_now(&self) -> Option<DateTime<Utc>> {
        self.offset.map(|_| self.utcnow())
    }

    /// Whether a hardware time was ever applied.
    pub fn is_synchronized(&self) -> bool {
        self.offset.is_some()
    }

    /// Adopt `time` as the current time.
    pub fn synchronize_epoch(&mut self, time: DateTime<Utc>) {
        let offset = time.signed_duration_since(self.wall.now());
        self.offset = Some(offset);
        info!(
            "Synchronized time: {} (timezone {}, offset {}s)",
            time.format("%Y-%m-%d %H:%M:%S"),
            self.timezone,
            offset.num_seconds()
        );
    }
}

impl std::fmt::Debug for RealTimeClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealTimeClock")
            .field("timezone", &self.timezone)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
