//! Driver registry for antenna drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories. Constructed at startup and passed by reference; there is no
//! global registry.

use hwmc_common::antenna::AntennaId;
use hwmc_common::hal::driver::{AntennaDriver, DriverError, DriverFactory};
use std::collections::HashMap;

use crate::drivers;

/// Registry of available antenna drivers.
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

    /// Create a registry populated with every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance for one antenna.
    ///
    /// # Errors
    /// Returns `DriverError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(
        &self,
        name: &str,
        antenna: AntennaId,
    ) -> Result<Box<dyn AntennaDriver>, DriverError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| DriverError::DriverNotFound(name.to_string()))?;
        Ok(factory(antenna))
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
