//! Simulation driver module.
//!
//! Software stand-in for an antenna controller: elevation physics driven by
//! the motor and brake lines, and a digital state word that reflects what
//! was last written.

mod driver;
mod physics;

pub use driver::SimulationDriver;
pub use physics::ElevationModel;

use hwmc_common::antenna::AntennaId;
use hwmc_common::hal::driver::AntennaDriver;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver(antenna: AntennaId) -> Box<dyn AntennaDriver> {
    Box::new(SimulationDriver::new(antenna))
}
