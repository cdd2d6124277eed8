//! Time periods such as `update_interval = "15min"`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A positive duration or `never`.
///
/// Accepted forms: `"never"`, `"<integer><unit>"` with unit `ms`, `s`,
/// `min`, `h` or `d`, or a bare TOML integer counting seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    /// Disabled.
    Never,
    /// Repeats every given duration.
    Every(Duration),
}

impl TimePeriod {
    /// The duration, or `None` for `never`.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::Every(duration) => Some(*duration),
        }
    }

    /// Milliseconds, or `None` for `never`.
    pub fn as_millis(&self) -> Option<u64> {
        self.as_duration()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    fn from_secs(secs: u64) -> Result<Self, String> {
        if secs == 0 {
            return Err("time period must be greater than zero".to_string());
        }
        Ok(Self::Every(Duration::from_secs(secs)))
    }
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("never") {
            return Ok(Self::Never);
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("time period '{s}' has no unit (ms, s, min, h, d)"))?;
        let (value, unit) = s.split_at(split);
        let value: u64 = value
            .parse()
            .map_err(|_| format!("time period '{s}' must start with a whole number"))?;

        let millis_per_unit = match unit.trim() {
            "ms" => 1,
            "s" => 1_000,
            "min" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            other => return Err(format!("unknown time unit '{other}' in '{s}'")),
        };

        let millis = value
            .checked_mul(millis_per_unit)
            .ok_or_else(|| format!("time period '{s}' is too large"))?;
        if millis == 0 {
            return Err("time period must be greater than zero".to_string());
        }
        Ok(Self::Every(Duration::from_millis(millis)))
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Every(duration) => write!(f, "{}ms", duration.as_millis()),
        }
    }
}

impl Serialize for TimePeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PeriodVisitor;

        impl Visitor<'_> for PeriodVisitor {
            type Value = TimePeriod;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a time period like \"15min\", \"never\" or a number of seconds")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TimePeriod, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TimePeriod, E> {
                let secs = u64::try_from(v)
                    .map_err(|_| E::custom("time period must be greater than zero"))?;
                TimePeriod::from_secs(secs).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TimePeriod, E> {
                TimePeriod::from_secs(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PeriodVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(
            "250ms".parse::<TimePeriod>().unwrap(),
            TimePeriod::Every(Duration::from_millis(250))
        );
        assert_eq!(
            "15min".parse::<TimePeriod>().unwrap(),
            TimePeriod::Every(Duration::from_secs(900))
        );
        assert_eq!(
            "2h".parse::<TimePeriod>().unwrap(),
            TimePeriod::Every(Duration::from_secs(7200))
        );
        assert_eq!("never".parse::<TimePeriod>().unwrap(), TimePeriod::Never);
    }

    #[test]
    fn rejects_malformed_periods() {
        for bad in ["", "15", "min", "0s", "1.5h", "10 fortnights", "-3s"] {
            assert!(bad.parse::<TimePeriod>().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn deserializes_strings_and_seconds() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            period: TimePeriod,
        }

        let w: Wrapper = toml::from_str("period = \"1h\"").unwrap();
        assert_eq!(w.period.as_millis(), Some(3_600_000));

        let w: Wrapper = toml::from_str("period = 30").unwrap();
        assert_eq!(w.period.as_duration(), Some(Duration::from_secs(30)));

        assert!(toml::from_str::<Wrapper>("period = 0").is_err());
        assert!(toml::from_str::<Wrapper>("period = true").is_err());
    }

    #[test]
    fn never_has_no_duration() {
        assert_eq!(TimePeriod::Never.as_millis(), None);
        assert_eq!(TimePeriod::Never.to_string(), "never");
    }
}
