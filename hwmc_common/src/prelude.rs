//! Prelude module for common re-exports.
//!
//! ```rust
//! use hwmc_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::Severity;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Antennas & commands ────────────────────────────────────────────
pub use crate::antenna::AntennaId;
pub use crate::command::{Command, CommandLine, TargetSelector};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{AntennaDriver, DriverError, DriverFactory};
pub use crate::hal::types::{DigitalOutput, DioStatus, DriveCommand, DriveState, RawFrame};

// ─── Monitor points ─────────────────────────────────────────────────
pub use crate::monitor::{Mjd, MonitorPointRecord, MonitorPointSet, MonitorValue};

// ─── Lifecycle ──────────────────────────────────────────────────────
pub use crate::shutdown::Shutdown;
