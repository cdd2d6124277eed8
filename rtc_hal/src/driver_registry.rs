//! Driver registry for RTC drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories by the class name used in generated code. This uses
//! constructor-injection rather than global state.

use crate::clock::WallClock;
use crate::driver::{DriverFactory, RtcDriver};
use crate::error::HalError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available RTC drivers.
///
/// Constructed at startup, populated via `register()`, and passed to
/// `NodeCore::from_code`. No global state, testable in isolation.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in driver installed.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same class is already registered.
    pub fn register(&mut self, class: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(class) {
            panic!("Driver '{class}' is already registered");
        }
        self.factories.insert(class, factory);
    }

    /// Get a driver factory by class.
    pub fn get_factory(&self, class: &str) -> Option<DriverFactory> {
        self.factories.get(class).copied()
    }

    /// Create a driver instance of `class` named `id`.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given class is registered.
    pub fn create_driver(
        &self,
        class: &str,
        id: &str,
        wall: Arc<dyn WallClock>,
    ) -> Result<Box<dyn RtcDriver>, HalError> {
        let factory = self
            .get_factory(class)
            .ok_or_else(|| HalError::DriverNotFound(class.to_string()))?;
        Ok(factory(id, wall))
    }

    /// List all registered driver classes.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemWallClock;
    use crate::driver::I2cDevice;
    use crate::error::RtcError;
    use chrono::{DateTime, Utc};

    struct TestDriver {
        id: String,
    }

    impl RtcDriver for TestDriver {
        fn class(&self) -> &'static str {
            "test::TestClock"
        }

        fn id(&self) -> &str {
            &self.id
        }

        fn setup(&mut self) -> Result<(), RtcError> {
            Ok(())
        }

        fn update(&mut self) -> Result<(), RtcError> {
            Ok(())
        }

        fn dump_config(&self) {}

        fn is_failed(&self) -> bool {
            false
        }

        fn mark_failed(&mut self) {}

        fn set_vdsl(&mut self, _battery_backup: bool) {}

        fn battery_backup(&self) -> bool {
            false
        }

        fn attach_i2c(&mut self, _device: I2cDevice) {}

        fn set_timezone(&mut self, _timezone: &str) {}

        fn read_time(&mut self) -> Result<DateTime<Utc>, RtcError> {
            Err(RtcError::NotAttached)
        }

        fn write_time(&mut self) -> Result<(), RtcError> {
            Err(RtcError::NotAttached)
        }

        fn now(&self) -> Option<DateTime<Utc>> {
            None
        }
    }

    fn create_test_driver(id: &str, _wall: Arc<dyn WallClock>) -> Box<dyn RtcDriver> {
        Box::new(TestDriver { id: id.to_string() })
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("test::TestClock", create_test_driver);

        let driver = reg
            .create_driver("test::TestClock", "clock_1", Arc::new(SystemWallClock))
            .expect("should create");
        assert_eq!(driver.class(), "test::TestClock");
        assert_eq!(driver.id(), "clock_1");
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_driver("nonexistent", "x", Arc::new(SystemWallClock));
        assert!(matches!(result, Err(HalError::DriverNotFound(_))));
    }

    #[test]
    fn registry_list_drivers() {
        let mut reg = DriverRegistry::new();
        reg.register("alpha", create_test_driver);
        reg.register("beta", create_test_driver);

        let mut names = reg.list_drivers();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn builtin_drivers_include_rx8025() {
        let reg = DriverRegistry::with_builtin_drivers();
        assert!(
            reg.get_factory(rtc_common::consts::RX8025_COMPONENT_CLASS)
                .is_some()
        );
        assert_eq!(
            reg.list_drivers(),
            vec![rtc_common::consts::RX8025_COMPONENT_CLASS]
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", create_test_driver);
        reg.register("dup", create_test_driver);
    }
}
