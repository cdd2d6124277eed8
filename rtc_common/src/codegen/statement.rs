//! Generated statements.
//!
//! A build produces an ordered list of statements. Each statement either
//! instantiates an object or wires an existing one into a registry. The
//! runtime interprets them in order; the text form is for humans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Trigger of a generated automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Runs once after setup.
    Boot,
    /// Runs every `period_ms`.
    Interval {
        /// Period in milliseconds.
        period_ms: u64,
    },
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boot => write!(f, "on_boot"),
            Self::Interval { period_ms } => write!(f, "interval({period_ms}ms)"),
        }
    }
}

/// One generation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Statement {
    /// Open an I2C bus.
    NewI2cBus { id: String, device: PathBuf },
    /// Instantiate an object of `class`.
    NewVariable { id: String, class: String },
    /// Set the battery-backup (VDSL) flag of an RX8025.
    SetVdsl { id: String, value: bool },
    /// Register with the component lifecycle (setup, periodic update).
    RegisterComponent {
        id: String,
        update_interval_ms: Option<u64>,
    },
    /// Attach to an I2C bus at an address.
    RegisterI2cDevice { id: String, bus: String, address: u8 },
    /// Register as a time provider.
    RegisterTime { id: String, timezone: String },
    /// Bind an action object to its parent component.
    RegisterParented { id: String, parent: String },
    /// Create an automation running the listed actions.
    NewAutomation {
        id: String,
        trigger: Trigger,
        actions: Vec<String>,
    },
}

impl Statement {
    /// Id of the object the statement creates or configures.
    pub fn target(&self) -> &str {
        match self {
            Self::NewI2cBus { id, .. }
            | Self::NewVariable { id, .. }
            | Self::SetVdsl { id, .. }
            | Self::RegisterComponent { id, .. }
            | Self::RegisterI2cDevice { id, .. }
            | Self::RegisterTime { id, .. }
            | Self::RegisterParented { id, .. }
            | Self::NewAutomation { id, .. } => id,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewI2cBus { id, device } => {
                write!(f, "{id} = new i2c::I2CBus(\"{}\")", device.display())
            }
            Self::NewVariable { id, class } => write!(f, "{id} = new {class}()"),
            Self::SetVdsl { id, value } => write!(f, "{id}.set_vdsl({value})"),
            Self::RegisterComponent {
                id,
                update_interval_ms,
            } => match update_interval_ms {
                Some(ms) => write!(f, "register_component({id}, update_interval={ms}ms)"),
                None => write!(f, "register_component({id}, update_interval=never)"),
            },
            Self::RegisterI2cDevice { id, bus, address } => {
                write!(f, "register_i2c_device({id}, bus={bus}, address=0x{address:02X})")
            }
            Self::RegisterTime { id, timezone } => {
                write!(f, "register_time({id}, timezone=\"{timezone}\")")
            }
            Self::RegisterParented { id, parent } => write!(f, "register_parented({id}, {parent})"),
            Self::NewAutomation {
                id,
                trigger,
                actions,
            } => write!(
                f,
                "{id} = new Automation({trigger}, [{}])",
                actions.join(", ")
            ),
        }
    }
}

/// Ordered output of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    statements: Vec<Statement>,
}

impl GeneratedCode {
    /// Wrap a statement list.
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// All statements in generation order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Statements touching `id`, in order.
    pub fn statements_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Statement> + 'a {
        self.statements.iter().filter(move |s| s.target() == id)
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether nothing was generated.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Pretty JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for GeneratedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}
