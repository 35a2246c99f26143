//! Motion Controller.
//!
//! - [`command`] - Verb validation and help text
//! - [`snapshot`] - Monitor-point snapshot and channel conversions
//! - [`controller`] - Poll loop, command execution and closed-loop moves

pub mod command;
pub mod controller;
pub mod snapshot;

pub use command::{AntennaCommand, CommandError, Jog, MoveTarget, Polarization};
pub use controller::{ControllerSettings, MotionController, MoveOutcome};
pub use snapshot::MonitorSnapshot;
