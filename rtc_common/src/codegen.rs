//! Code generation.
//!
//! A validated [`NodeConfig`] is turned into an ordered [`GeneratedCode`]
//! in a single pass:
//!
//! 1. explicit ids are declared (buses, time platforms, automations),
//! 2. missing ids are generated in declaration order,
//! 3. buses, then time platforms, then automations emit their statements.
//!
//! Identical input always yields identical output. Any error aborts the
//! build and no statements are returned.

pub mod actions;
pub mod rx8025;
pub mod statement;

use crate::config::{ConfigError, NodeConfig};
use crate::consts::{AUTOMATION_CLASS, I2C_BUS_CLASS, RX8025_COMPONENT_CLASS};
use crate::schema::action::{AutomationConfig, TriggerKind};
use crate::schema::id::IdRegistry;
use crate::schema::period::TimePeriod;
use actions::ActionRegistry;
use statement::{GeneratedCode, Statement, Trigger};
use tracing::{debug, info};

/// Mutable state of one build: declared ids and emitted statements.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    ids: IdRegistry,
    statements: Vec<Statement>,
}

impl CodeBuilder {
    /// Start an empty build.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared ids.
    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    /// Declared ids, for declaring or generating.
    pub fn ids_mut(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    /// Append a statement.
    pub fn push(&mut self, statement: Statement) {
        debug!("emit: {statement}");
        self.statements.push(statement);
    }

    /// Finish the build.
    pub fn finish(self) -> GeneratedCode {
        GeneratedCode::new(self.statements)
    }
}

/// Validate a configuration without keeping the output.
///
/// Runs field validation and the full generation pass, so reference errors
/// are reported as well.
pub fn validate_config(config: &NodeConfig) -> Result<(), ConfigError> {
    generate(config).map(|_| ())
}

/// Generate code with the built-in actions.
pub fn generate(config: &NodeConfig) -> Result<GeneratedCode, ConfigError> {
    generate_with(config, &ActionRegistry::with_builtin_actions())
}

/// Generate code with a caller-supplied action registry.
pub fn generate_with(
    config: &NodeConfig,
    actions: &ActionRegistry,
) -> Result<GeneratedCode, ConfigError> {
    config.validate()?;

    let mut builder = CodeBuilder::new();

    for bus in &config.i2c {
        if let Some(id) = &bus.id {
            builder.ids_mut().declare(id, I2C_BUS_CLASS)?;
        }
    }
    for rtc in config.rx8025s() {
        if let Some(id) = &rtc.id {
            builder.ids_mut().declare(id, RX8025_COMPONENT_CLASS)?;
        }
    }
    for automation in &config.automation {
        if let Some(id) = &automation.id {
            builder.ids_mut().declare(id, AUTOMATION_CLASS)?;
        }
    }

    let bus_ids = resolve_ids(
        &mut builder,
        config.i2c.iter().map(|b| b.id.as_deref()),
        I2C_BUS_CLASS,
    );
    let rtc_ids = resolve_ids(
        &mut builder,
        config.rx8025s().map(|r| r.id.as_deref()),
        RX8025_COMPONENT_CLASS,
    );
    let automation_ids = resolve_ids(
        &mut builder,
        config.automation.iter().map(|a| a.id.as_deref()),
        AUTOMATION_CLASS,
    );

    for (bus, id) in config.i2c.iter().zip(bus_ids) {
        builder.push(Statement::NewI2cBus {
            id,
            device: bus.device.clone(),
        });
    }

    for (rtc, id) in config.rx8025s().zip(rtc_ids) {
        rx8025::rx8025_to_code(&mut builder, &id, rtc)?;
    }

    for (automation, id) in config.automation.iter().zip(automation_ids) {
        automation_to_code(&mut builder, actions, &id, automation)?;
    }

    let code = builder.finish();
    info!(
        "Generated {} statements for '{}'",
        code.len(),
        config.shared.service_name
    );
    Ok(code)
}

/// Keep explicit ids, generate the missing ones.
fn resolve_ids<'a>(
    builder: &mut CodeBuilder,
    ids: impl Iterator<Item = Option<&'a str>>,
    class: &'static str,
) -> Vec<String> {
    ids.map(|id| match id {
        Some(id) => id.to_string(),
        None => builder.ids_mut().generate(class),
    })
    .collect()
}

/// Emit the actions of an automation followed by the automation itself.
fn automation_to_code(
    builder: &mut CodeBuilder,
    actions: &ActionRegistry,
    id: &str,
    automation: &AutomationConfig,
) -> Result<(), ConfigError> {
    let trigger = match (automation.trigger, automation.interval) {
        (TriggerKind::Boot, _) => Trigger::Boot,
        (TriggerKind::Interval, Some(period @ TimePeriod::Every(_))) => Trigger::Interval {
            period_ms: period.as_millis().unwrap_or(u64::MAX),
        },
        (TriggerKind::Interval, _) => {
            return Err(ConfigError::ValidationError(format!(
                "automation '{id}' needs a finite interval"
            )));
        }
    };

    let mut action_ids = Vec::with_capacity(automation.then.len());
    for action in &automation.then {
        let definition = actions.get(&action.name).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "Unable to find action with the name '{}'",
                action.name
            ))
        })?;

        let target = (definition.schema)(&action.name, &action.args)?;
        let action_id = builder.ids_mut().generate(definition.class);
        (definition.to_code)(builder, &action_id, target.as_deref())?;
        action_ids.push(action_id);
    }

    builder.push(Statement::NewAutomation {
        id: id.to_string(),
        trigger,
        actions: action_ids,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    fn config(toml_str: &str) -> NodeConfig {
        NodeConfig::from_toml_str(toml_str).unwrap()
    }

    #[test]
    fn generated_ids_follow_declaration_order() {
        let code = generate(&config(
            r#"
[shared]
service_name = "node"

[[i2c]]

[[time]]
platform = "rx8025"

[[time]]
platform = "rx8025"
address = 0x32
"#,
        ))
        .unwrap();

        let created: Vec<&str> = code
            .statements()
            .iter()
            .filter_map(|s| match s {
                Statement::NewVariable { id, .. } | Statement::NewI2cBus { id, .. } => {
                    Some(id.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            vec![
                "i2c_i2cbus_id",
                "rx8025_rx8025component_id",
                "rx8025_rx8025component_id_2"
            ]
        );
    }

    #[test]
    fn explicit_id_wins_over_generated_name() {
        let code = generate(&config(
            r#"
[shared]
service_name = "node"

[[i2c]]

[[time]]
platform = "rx8025"

[[time]]
platform = "rx8025"
id = "rx8025_rx8025component_id"
address = 0x32
"#,
        ))
        .unwrap();

        assert!(code
            .statements()
            .contains(&Statement::NewVariable {
                id: "rx8025_rx8025component_id_2".into(),
                class: RX8025_COMPONENT_CLASS.into(),
            }));
    }

    #[test]
    fn duplicate_ids_across_classes_rejected() {
        let result = generate(&config(
            r#"
[shared]
service_name = "node"

[[i2c]]
id = "clock"

[[time]]
platform = "rx8025"
id = "clock"
"#,
        ));
        assert!(matches!(result, Err(ConfigError::Reference(_))));
    }

    #[test]
    fn unknown_action_rejected() {
        let result = generate(&config(
            r#"
[shared]
service_name = "node"

[[i2c]]

[[time]]
platform = "rx8025"

[[automation]]
trigger = "boot"
then = [{ "rx8025.set_alarm" = {} }]
"#,
        ));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("rx8025.set_alarm"));
    }

    #[test]
    fn interval_automation_carries_period() {
        let code = generate(&config(
            r#"
[shared]
service_name = "node"

[[i2c]]

[[time]]
platform = "rx8025"

[[automation]]
id = "hourly"
trigger = "interval"
interval = "1h"
then = [{ "rx8025.write_time" = {} }]
"#,
        ))
        .unwrap();

        let last = code.statements().last().unwrap();
        assert_eq!(
            last,
            &Statement::NewAutomation {
                id: "hourly".into(),
                trigger: Trigger::Interval {
                    period_ms: 3_600_000
                },
                actions: vec!["rx8025_writeaction_id".into()],
            }
        );
    }
}
