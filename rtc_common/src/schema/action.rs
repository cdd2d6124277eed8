//! Automation and action schemas.
//!
//! An action entry is a single-key table: the key names the action, the
//! value carries the action's arguments. The argument schema belongs to the
//! action and is applied during generation (see
//! [`crate::codegen::actions`]).
//!
//! ```toml
//! [[automation]]
//! trigger = "interval"
//! interval = "1h"
//! then = [
//!     { "rx8025.write_time" = { id = "rtc" } },
//!     { "rx8025.read_time" = "rtc" },
//! ]
//! ```

use crate::config::ConfigError;
use crate::schema::period::TimePeriod;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// When an automation fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Once, after all components are set up.
    Boot,
    /// Every `interval`.
    Interval,
}

/// One `[[automation]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    /// Automation id; generated when omitted.
    #[serde(default)]
    pub id: Option<String>,

    /// Trigger kind.
    pub trigger: TriggerKind,

    /// Period of `interval` triggers.
    #[serde(default)]
    pub interval: Option<TimePeriod>,

    /// Actions run in order when the trigger fires.
    pub then: Vec<ActionConfig>,
}

impl AutomationConfig {
    /// Validate trigger/interval consistency and the action list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.then.is_empty() {
            return Err(ConfigError::ValidationError(
                "automation 'then' must contain at least one action".to_string(),
            ));
        }

        match (self.trigger, self.interval) {
            (TriggerKind::Interval, None) => Err(ConfigError::ValidationError(
                "interval trigger requires 'interval'".to_string(),
            )),
            (TriggerKind::Interval, Some(TimePeriod::Never)) => Err(
                ConfigError::ValidationError("interval trigger cannot be 'never'".to_string()),
            ),
            (TriggerKind::Boot, Some(_)) => Err(ConfigError::ValidationError(
                "'interval' is only valid with trigger = \"interval\"".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// An action invocation: action name plus raw arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfig {
    /// Registered action name, e.g. `rx8025.read_time`.
    pub name: String,
    /// Arguments, validated by the action's schema.
    pub args: toml::Value,
}

impl ActionConfig {
    /// Build an action entry.
    pub fn new(name: impl Into<String>, args: toml::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl<'de> Deserialize<'de> for ActionConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, toml::Value>::deserialize(deserializer)?;
        let mut entries = entries.into_iter();
        match (entries.next(), entries.next()) {
            (Some((name, args)), None) => Ok(Self { name, args }),
            (None, _) => Err(de::Error::custom("action entry is empty")),
            (Some(_), Some(_)) => Err(de::Error::custom(
                "action entry must contain exactly one action",
            )),
        }
    }
}

impl Serialize for ActionConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.args)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<AutomationConfig, toml::de::Error> {
        toml::from_str(toml_str)
    }

    #[test]
    fn parses_action_entries() {
        let automation = parse(
            r#"
trigger = "boot"
then = [
    { "rx8025.read_time" = "rtc" },
    { "rx8025.write_time" = { id = "rtc" } },
    { "rx8025.read_time" = {} },
]
"#,
        )
        .unwrap();

        assert_eq!(automation.trigger, TriggerKind::Boot);
        assert_eq!(automation.then.len(), 3);
        assert_eq!(automation.then[0].name, "rx8025.read_time");
        assert_eq!(automation.then[0].args.as_str(), Some("rtc"));
        assert!(automation.then[1].args.is_table());
        assert!(automation.validate().is_ok());
    }

    #[test]
    fn action_entry_needs_exactly_one_key() {
        assert!(parse("trigger = \"boot\"\nthen = [{}]").is_err());
        assert!(
            parse(
                r#"
trigger = "boot"
then = [{ "rx8025.read_time" = "a", "rx8025.write_time" = "a" }]
"#
            )
            .is_err()
        );
    }

    #[test]
    fn interval_rules() {
        let automation = parse(
            r#"
trigger = "interval"
interval = "1h"
then = [{ "rx8025.write_time" = {} }]
"#,
        )
        .unwrap();
        assert!(automation.validate().is_ok());

        let mut missing = automation.clone();
        missing.interval = None;
        assert!(missing.validate().is_err());

        let mut never = automation.clone();
        never.interval = Some(TimePeriod::Never);
        assert!(never.validate().is_err());

        let mut boot = automation;
        boot.trigger = TriggerKind::Boot;
        assert!(boot.validate().is_err());
    }

    #[test]
    fn empty_action_list_rejected() {
        let automation = parse("trigger = \"boot\"\nthen = []").unwrap();
        assert!(matches!(
            automation.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
