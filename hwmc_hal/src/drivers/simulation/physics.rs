//! Elevation axis physics.

use hwmc_common::hal::types::DriveCommand;
use std::time::Duration;
use tracing::trace;

/// Default elevation slew rate (deg/min).
pub const DEFAULT_DRIVE_RATE: f64 = 40.0;

/// Constant-rate elevation axis with hard stops at both ends.
#[derive(Debug, Clone)]
pub struct ElevationModel {
    /// Current elevation (deg)
    elevation: f64,
    /// Slew rate (deg/s)
    rate: f64,
    /// Lower hard stop (deg)
    min: f64,
    /// Upper hard stop (deg)
    max: f64,
}

impl ElevationModel {
    /// Create a model at `elevation`, slewing at `rate_deg_per_min`.
    pub fn new(elevation: f64, rate_deg_per_min: f64, min: f64, max: f64) -> Self {
        Self {
            elevation: elevation.clamp(min, max),
            rate: rate_deg_per_min / 60.0,
            min,
            max,
        }
    }

    /// Current elevation (deg).
    #[inline]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Teleport to an elevation, e.g. to seed a test.
    pub fn set_elevation(&mut self, elevation: f64) {
        self.elevation = elevation.clamp(self.min, self.max);
    }

    /// At or beyond the upper hard stop.
    pub fn at_plus_limit(&self) -> bool {
        self.elevation >= self.max
    }

    /// At or beyond the lower hard stop.
    pub fn at_minus_limit(&self) -> bool {
        self.elevation <= self.min
    }

    /// Advance by `dt`. The axis only moves with the brake released.
    pub fn advance(&mut self, dt: Duration, drive: DriveCommand, brake_engaged: bool) {
        if brake_engaged {
            return;
        }
        let step = self.rate * dt.as_secs_f64();
        let next = match drive {
            DriveCommand::Up => self.elevation + step,
            DriveCommand::Down => self.elevation - step,
            DriveCommand::Off => return,
        };
        self.elevation = next.clamp(self.min, self.max);
        trace!("elevation {:.3} deg ({:?})", self.elevation, drive);
    }
}

impl Default for ElevationModel {
    fn default() -> Self {
        Self::new(90.0, DEFAULT_DRIVE_RATE, 0.0, 180.0)
    }
}
