//! Action registry.
//!
//! Maps action names to their argument schema and code generator. Built
//! once per build and passed to [`crate::codegen::generate_with`]; no
//! global state.

use crate::codegen::CodeBuilder;
use crate::config::ConfigError;
use std::collections::HashMap;

/// Validates action arguments; returns the explicit target id, if any.
pub type ActionSchema = fn(action: &str, args: &toml::Value) -> Result<Option<String>, ConfigError>;

/// Emits the statements of one action instance.
pub type ActionToCode =
    fn(builder: &mut CodeBuilder, action_id: &str, target: Option<&str>) -> Result<(), ConfigError>;

/// A registered action.
#[derive(Debug, Clone, Copy)]
pub struct ActionDefinition {
    /// Action name used in configuration.
    pub name: &'static str,
    /// Class of the generated action object.
    pub class: &'static str,
    /// Argument schema.
    pub schema: ActionSchema,
    /// Code generator.
    pub to_code: ActionToCode,
}

/// Registry of available actions.
pub struct ActionRegistry {
    actions: HashMap<&'static str, ActionDefinition>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Registry holding every built-in action.
    pub fn with_builtin_actions() -> Self {
        let mut registry = Self::new();
        super::rx8025::register_actions(&mut registry);
        registry
    }

    /// Register an action.
    ///
    /// # Panics
    /// Panics if an action with the same name is already registered.
    pub fn register(&mut self, definition: ActionDefinition) {
        if self.actions.contains_key(definition.name) {
            panic!("Action '{}' is already registered", definition.name);
        }
        self.actions.insert(definition.name, definition);
    }

    /// Look up an action by name.
    pub fn get(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions.get(name)
    }

    /// Registered action names, sorted.
    pub fn list_actions(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.actions.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema taking a table with an optional `id`.
pub fn id_schema(action: &str, args: &toml::Value) -> Result<Option<String>, ConfigError> {
    let table = args.as_table().ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "{action}: expected a table like {{ id = \"...\" }}, got {}",
            args.type_str()
        ))
    })?;

    if let Some(key) = table.keys().find(|key| key.as_str() != "id") {
        return Err(ConfigError::ValidationError(format!(
            "{action}: extra key '{key}' not allowed"
        )));
    }

    match table.get("id") {
        None => Ok(None),
        Some(toml::Value::String(id)) => Ok(Some(id.clone())),
        Some(other) => Err(ConfigError::ValidationError(format!(
            "{action}: id must be a string, got {}",
            other.type_str()
        ))),
    }
}

/// Schema accepting either a bare id string or [`id_schema`]'s table.
pub fn maybe_simple_id_schema(
    action: &str,
    args: &toml::Value,
) -> Result<Option<String>, ConfigError> {
    match args {
        toml::Value::String(id) => Ok(Some(id.clone())),
        other => id_schema(action, other),
    }
}
