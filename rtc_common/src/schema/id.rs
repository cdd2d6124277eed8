//! Identifier declaration and resolution.
//!
//! Every generated object has a unique id. Ids are either declared
//! explicitly in the configuration or generated from the object's class.
//! References (`use_id`) resolve against the declared ids, defaulting to
//! the sole instance of the requested class when no id is given.

use thiserror::Error;

/// Errors raised while declaring or resolving ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Id is not a valid identifier.
    #[error("'{0}' is not a valid id: use letters, digits and underscores, not starting with a digit")]
    InvalidId(String),

    /// Id declared twice.
    #[error("ID '{0}' redefined")]
    DuplicateId(String),

    /// Referenced id was never declared.
    #[error("Couldn't find ID '{0}'")]
    UnknownId(String),

    /// Referenced id belongs to another class.
    #[error("ID '{id}' of type {actual} doesn't inherit from {expected}")]
    TypeMismatch {
        /// Referenced id.
        id: String,
        /// Class the reference requires.
        expected: String,
        /// Class the id was declared with.
        actual: String,
    },

    /// No id given and no instance of the class exists.
    #[error("Couldn't find any component that can be used for {class}, please declare one")]
    NoInstance {
        /// Requested class.
        class: String,
    },

    /// No id given and several instances of the class exist.
    #[error("Multiple {class} found ({}), please specify an id", .candidates.join(", "))]
    Ambiguous {
        /// Requested class.
        class: String,
        /// Ids of all candidate instances.
        candidates: Vec<String>,
    },
}

/// A declared id and the class of the object it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredId {
    /// Identifier.
    pub id: String,
    /// Class name (e.g. `rx8025::RX8025Component`).
    pub class: &'static str,
}

/// Registry of declared ids.
///
/// Keeps declaration order so resolution and generated ids are
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    declared: Vec<DeclaredId>,
}

impl IdRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an explicit id.
    ///
    /// # Errors
    /// `InvalidId` for malformed ids, `DuplicateId` if already declared.
    pub fn declare(&mut self, id: &str, class: &'static str) -> Result<(), IdError> {
        validate_id(id)?;
        if self.contains(id) {
            return Err(IdError::DuplicateId(id.to_string()));
        }
        self.declared.push(DeclaredId {
            id: id.to_string(),
            class,
        });
        Ok(())
    }

    /// Generate and declare a fresh id for `class`.
    ///
    /// The first id is derived from the class name, following ones get a
    /// numeric suffix: `rx8025_rx8025component_id`, `..._id_2`, ...
    pub fn generate(&mut self, class: &'static str) -> String {
        let base = default_id_base(class);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.declared.push(DeclaredId {
            id: candidate.clone(),
            class,
        });
        candidate
    }

    /// Resolve a reference to an object of `class`.
    ///
    /// With an explicit id the id must exist and carry the class. Without
    /// one, exactly one instance of the class must be declared.
    pub fn resolve(&self, requested: Option<&str>, class: &str) -> Result<String, IdError> {
        if let Some(id) = requested {
            let declared = self
                .declared
                .iter()
                .find(|d| d.id == id)
                .ok_or_else(|| IdError::UnknownId(id.to_string()))?;
            if declared.class != class {
                return Err(IdError::TypeMismatch {
                    id: id.to_string(),
                    expected: class.to_string(),
                    actual: declared.class.to_string(),
                });
            }
            return Ok(declared.id.clone());
        }

        let candidates: Vec<String> = self.instances_of(class).map(str::to_string).collect();
        match candidates.as_slice() {
            [] => Err(IdError::NoInstance {
                class: class.to_string(),
            }),
            [only] => Ok(only.clone()),
            _ => Err(IdError::Ambiguous {
                class: class.to_string(),
                candidates,
            }),
        }
    }

    /// Ids of all declared instances of `class`, in declaration order.
    pub fn instances_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.declared
            .iter()
            .filter(move |d| d.class == class)
            .map(|d| d.id.as_str())
    }

    /// Whether `id` is declared.
    pub fn contains(&self, id: &str) -> bool {
        self.declared.iter().any(|d| d.id == id)
    }

    /// Number of declared ids.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}

/// Check identifier syntax: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_id(id: &str) -> Result<(), IdError> {
    let mut chars = id.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IdError::InvalidId(id.to_string()))
    }
}

/// `rx8025::RX8025Component` -> `rx8025_rx8025component_id`
fn default_id_base(class: &str) -> String {
    let mut base = class.replace("::", "_").to_ascii_lowercase();
    base.push_str("_id");
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    const RTC: &str = "rx8025::RX8025Component";
    const BUS: &str = "i2c::I2CBus";

    #[test]
    fn declare_rejects_duplicates() {
        let mut ids = IdRegistry::new();
        ids.declare("rtc", RTC).unwrap();
        assert_eq!(
            ids.declare("rtc", BUS),
            Err(IdError::DuplicateId("rtc".to_string()))
        );
    }

    #[test]
    fn declare_rejects_invalid_identifiers() {
        let mut ids = IdRegistry::new();
        for bad in ["", "1rtc", "my-rtc", "rtc clock", "rtc.1"] {
            assert!(matches!(ids.declare(bad, RTC), Err(IdError::InvalidId(_))));
        }
        assert!(ids.is_empty());
        assert!(ids.declare("_rtc_2", RTC).is_ok());
    }

    #[test]
    fn generate_derives_ids_from_class() {
        let mut ids = IdRegistry::new();
        assert_eq!(ids.generate(RTC), "rx8025_rx8025component_id");
        assert_eq!(ids.generate(RTC), "rx8025_rx8025component_id_2");
        assert_eq!(ids.generate(BUS), "i2c_i2cbus_id");
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn generate_skips_explicitly_declared_ids() {
        let mut ids = IdRegistry::new();
        ids.declare("rx8025_rx8025component_id", RTC).unwrap();
        assert_eq!(ids.generate(RTC), "rx8025_rx8025component_id_2");
    }

    #[test]
    fn resolve_explicit_id() {
        let mut ids = IdRegistry::new();
        ids.declare("bus", BUS).unwrap();
        ids.declare("rtc", RTC).unwrap();

        assert_eq!(ids.resolve(Some("rtc"), RTC).unwrap(), "rtc");
        assert_eq!(
            ids.resolve(Some("clock"), RTC),
            Err(IdError::UnknownId("clock".to_string()))
        );
        assert!(matches!(
            ids.resolve(Some("bus"), RTC),
            Err(IdError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn resolve_defaults_to_sole_instance() {
        let mut ids = IdRegistry::new();
        assert!(matches!(
            ids.resolve(None, RTC),
            Err(IdError::NoInstance { .. })
        ));

        ids.declare("rtc_a", RTC).unwrap();
        assert_eq!(ids.resolve(None, RTC).unwrap(), "rtc_a");

        ids.declare("rtc_b", RTC).unwrap();
        let err = ids.resolve(None, RTC).unwrap_err();
        assert_eq!(
            err,
            IdError::Ambiguous {
                class: RTC.to_string(),
                candidates: vec!["rtc_a".to_string(), "rtc_b".to_string()],
            }
        );
        assert!(err.to_string().contains("rtc_a, rtc_b"));
    }
}
