//! Antenna discovery.
//!
//! Opens and initializes one driver per antenna before any controller
//! starts. Any failure is fatal to the caller: a partially discovered array
//! is not controllable.

use hwmc_common::antenna::AntennaId;
use hwmc_common::hal::driver::{AntennaDriver, DriverError};
use tracing::{debug, info};

use crate::driver_registry::DriverRegistry;

/// An initialized driver together with the antenna it serves.
pub struct DiscoveredAntenna {
    /// Antenna identifier
    pub id: AntennaId,
    /// Initialized driver, ready for polling
    pub driver: Box<dyn AntennaDriver>,
}

/// Open antennas `1..=count` with the named driver.
///
/// # Errors
/// Returns `DriverError::Discovery` if no antenna is requested, the driver is
/// unknown, or any device fails to initialize.
pub fn discover(
    registry: &DriverRegistry,
    driver_name: &str,
    count: u16,
) -> Result<Vec<DiscoveredAntenna>, DriverError> {
    info!("Searching for {} antenna controllers ({})", count, driver_name);
    if count == 0 {
        return Err(DriverError::Discovery("no antennas requested".to_string()));
    }

    let mut found = Vec::with_capacity(usize::from(count));
    for n in 1..=count {
        let Some(id) = AntennaId::new(n) else {
            continue;
        };
        let mut driver = registry
            .create_driver(driver_name, id)
            .map_err(|e| DriverError::Discovery(e.to_string()))?;
        driver
            .init()
            .map_err(|e| DriverError::Discovery(format!("antenna {id}: {e}")))?;
        debug!("Antenna {} connected via {}", id, driver.name());
        found.push(DiscoveredAntenna { id, driver });
    }

    info!("Discovered {} antennas", found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmc_common::hal::types::{OutputWrite, RawFrame};

    struct BrokenDriver;

    impl AntennaDriver for BrokenDriver {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn init(&mut self) -> Result<(), DriverError> {
            Err(DriverError::InitFailed("no route to device".to_string()))
        }

        fn read_frame(&mut self) -> Result<RawFrame, DriverError> {
            Err(DriverError::Communication("closed".to_string()))
        }

        fn write_outputs(&mut self, _writes: &[OutputWrite]) -> Result<(), DriverError> {
            Err(DriverError::Communication("closed".to_string()))
        }
    }

    fn broken(_antenna: AntennaId) -> Box<dyn AntennaDriver> {
        Box::new(BrokenDriver)
    }

    #[test]
    fn discovers_simulated_antennas_in_order() {
        let registry = DriverRegistry::with_builtin();
        let found = discover(&registry, "simulation", 3).unwrap();
        let ids: Vec<u16> = found.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn zero_antennas_is_an_error() {
        let registry = DriverRegistry::with_builtin();
        assert!(matches!(
            discover(&registry, "simulation", 0),
            Err(DriverError::Discovery(_))
        ));
    }

    #[test]
    fn unknown_driver_is_an_error() {
        let registry = DriverRegistry::with_builtin();
        assert!(matches!(
            discover(&registry, "labjack", 2),
            Err(DriverError::Discovery(_))
        ));
    }

    #[test]
    fn init_failure_aborts_discovery() {
        let mut registry = DriverRegistry::new();
        registry.register("broken", broken);
        let err = discover(&registry, "broken", 2).err().unwrap();
        assert!(err.to_string().contains("antenna 1"));
    }
}
