//! # Antenna HAL Library
//!
//! Antenna controller drivers with a pluggable driver architecture.
//! Drivers implement the `AntennaDriver` trait defined in
//! `hwmc_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`discovery`] - Opening and initializing one driver per antenna
//! - [`drivers`] - Driver implementations

#![deny(missing_docs)]

pub mod discovery;
pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::discovery::{discover, DiscoveredAntenna};
pub use crate::driver_registry::DriverRegistry;
