//! RX8025 code generation.
//!
//! The main component is instantiated, gets its battery-backup flag and is
//! then registered as a component, an I2C device and a time provider. The
//! two actions are bound to an RX8025 instance by id.

use crate::codegen::CodeBuilder;
use crate::codegen::actions::{ActionDefinition, ActionRegistry, id_schema, maybe_simple_id_schema};
use crate::codegen::statement::Statement;
use crate::config::ConfigError;
use crate::consts::{
    I2C_BUS_CLASS, READ_TIME_ACTION, RX8025_COMPONENT_CLASS, RX8025_READ_ACTION_CLASS,
    RX8025_WRITE_ACTION_CLASS, WRITE_TIME_ACTION,
};
use crate::schema::rx8025::Rx8025Config;

/// Register `rx8025.write_time` and `rx8025.read_time`.
pub fn register_actions(registry: &mut ActionRegistry) {
    registry.register(ActionDefinition {
        name: WRITE_TIME_ACTION,
        class: RX8025_WRITE_ACTION_CLASS,
        schema: id_schema,
        to_code: write_time_to_code,
    });
    registry.register(ActionDefinition {
        name: READ_TIME_ACTION,
        class: RX8025_READ_ACTION_CLASS,
        schema: maybe_simple_id_schema,
        to_code: read_time_to_code,
    });
}

/// Emit the main component.
pub fn rx8025_to_code(
    builder: &mut CodeBuilder,
    id: &str,
    config: &Rx8025Config,
) -> Result<(), ConfigError> {
    let bus = builder
        .ids()
        .resolve(config.i2c_id.as_deref(), I2C_BUS_CLASS)?;

    builder.push(Statement::NewVariable {
        id: id.to_string(),
        class: RX8025_COMPONENT_CLASS.to_string(),
    });
    builder.push(Statement::SetVdsl {
        id: id.to_string(),
        value: config.battery_1v5,
    });
    builder.push(Statement::RegisterComponent {
        id: id.to_string(),
        update_interval_ms: config.update_interval.as_millis(),
    });
    builder.push(Statement::RegisterI2cDevice {
        id: id.to_string(),
        bus,
        address: config.address,
    });
    builder.push(Statement::RegisterTime {
        id: id.to_string(),
        timezone: config.timezone.clone(),
    });
    Ok(())
}

/// Emit a write-time action bound to `target` (or the sole RX8025).
pub fn write_time_to_code(
    builder: &mut CodeBuilder,
    action_id: &str,
    target: Option<&str>,
) -> Result<(), ConfigError> {
    parented_action_to_code(builder, action_id, RX8025_WRITE_ACTION_CLASS, target)
}

/// Emit a read-time action bound to `target` (or the sole RX8025).
pub fn read_time_to_code(
    builder: &mut CodeBuilder,
    action_id: &str,
    target: Option<&str>,
) -> Result<(), ConfigError> {
    parented_action_to_code(builder, action_id, RX8025_READ_ACTION_CLASS, target)
}

fn parented_action_to_code(
    builder: &mut CodeBuilder,
    action_id: &str,
    class: &str,
    target: Option<&str>,
) -> Result<(), ConfigError> {
    let parent = builder.ids().resolve(target, RX8025_COMPONENT_CLASS)?;

    builder.push(Statement::NewVariable {
        id: action_id.to_string(),
        class: class.to_string(),
    });
    builder.push(Statement::RegisterParented {
        id: action_id.to_string(),
        parent,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::id::IdError;

    fn builder_with(rtcs: &[&str]) -> CodeBuilder {
        let mut builder = CodeBuilder::new();
        builder.ids_mut().declare("bus", I2C_BUS_CLASS).unwrap();
        for rtc in rtcs {
            builder.ids_mut().declare(rtc, RX8025_COMPONENT_CLASS).unwrap();
        }
        builder
    }

    #[test]
    fn main_component_statement_order() {
        let mut builder = builder_with(&["rtc"]);
        rx8025_to_code(&mut builder, "rtc", &Rx8025Config::default()).unwrap();
        let code = builder.finish();

        let ops: Vec<String> = code.statements().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            ops,
            vec![
                "rtc = new rx8025::RX8025Component()",
                "rtc.set_vdsl(false)",
                "register_component(rtc, update_interval=900000ms)",
                "register_i2c_device(rtc, bus=bus, address=0x64)",
                "register_time(rtc, timezone=\"UTC\")",
            ]
        );
    }

    #[test]
    fn unknown_bus_is_reference_error() {
        let mut builder = builder_with(&["rtc"]);
        let config = Rx8025Config {
            i2c_id: Some("bus_b".to_string()),
            ..Rx8025Config::default()
        };
        let err = rx8025_to_code(&mut builder, "rtc", &config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Reference(IdError::UnknownId(ref id)) if id == "bus_b"
        ));
    }

    #[test]
    fn write_action_binds_declared_target() {
        let mut builder = builder_with(&["rtc_a", "rtc_b"]);
        write_time_to_code(&mut builder, "action_1", Some("rtc_b")).unwrap();
        let code = builder.finish();
        assert_eq!(
            code.statements()[1],
            Statement::RegisterParented {
                id: "action_1".into(),
                parent: "rtc_b".into(),
            }
        );
    }

    #[test]
    fn write_action_rejects_undeclared_target() {
        let mut builder = builder_with(&["rtc"]);
        let err = write_time_to_code(&mut builder, "action_1", Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::Reference(IdError::UnknownId(_))));
    }

    #[test]
    fn read_action_default_target() {
        let mut builder = builder_with(&["rtc"]);
        read_time_to_code(&mut builder, "action_1", None).unwrap();
        assert_eq!(builder.finish().len(), 2);

        let mut builder = builder_with(&[]);
        assert!(matches!(
            read_time_to_code(&mut builder, "action_1", None),
            Err(ConfigError::Reference(IdError::NoInstance { .. }))
        ));

        let mut builder = builder_with(&["rtc_a", "rtc_b"]);
        assert!(matches!(
            read_time_to_code(&mut builder, "action_1", None),
            Err(ConfigError::Reference(IdError::Ambiguous { .. }))
        ));
    }
}
