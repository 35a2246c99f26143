//! Antenna driver trait and error types.
//!
//! This module defines:
//! - `AntennaDriver` trait - Interface for pluggable antenna controller backends
//! - `DriverError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type

use crate::antenna::AntennaId;
use crate::hal::types::{OutputWrite, RawFrame};
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    Communication(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Devices could not be enumerated or opened
    #[error("Device discovery failed: {0}")]
    Discovery(String),
}

/// Factory function type for creating one driver instance per antenna.
pub type DriverFactory = fn(AntennaId) -> Box<dyn AntennaDriver>;

/// Trait defining the interface for antenna controller drivers.
///
/// One instance is owned exclusively by the motion controller thread of
/// its antenna, so implementations need `Send` but not `Sync`.
///
/// # Lifecycle
///
/// 1. `init()` - Called once during discovery, before any controller starts
/// 2. `read_frame()` / `write_outputs()` - Called from the controller thread
/// 3. `shutdown()` - Called when the controller exits
pub trait AntennaDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Configure the device: analog input range and digital line directions.
    ///
    /// # Errors
    /// Return `DriverError::InitFailed` if the device cannot be configured.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Read all monitored channels in one batch.
    fn read_frame(&mut self) -> Result<RawFrame, DriverError>;

    /// Write a batch of digital line levels.
    ///
    /// All writes of one call are issued together; callers rely on this to
    /// switch both drive lines at once.
    fn write_outputs(&mut self, writes: &[OutputWrite]) -> Result<(), DriverError>;

    /// Release the device.
    /// Default: no-op
    fn shutdown(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}
