//! Fabric configuration.
//!
//! One TOML file with a section per component. Every field has a default, so
//! an empty file (or no file at all) yields the stock 110-antenna setup.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//!
//! [monitor]
//! bind = "0.0.0.0:50000"
//!
//! [command]
//! bind = "0.0.0.0:50001"
//! queue_depth = 5
//!
//! [hardware]
//! driver = "simulation"
//! antennas = 110
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hwmc_common::config::{ConfigError, ConfigLoader, SharedConfig};
use hwmc_common::consts::{
    ANT_CMD_Q_DEPTH, COMMAND_BIND, DEFAULT_FILE_PREFIX, MONITOR_BIND, NUM_ANTENNAS,
    POLLING_INTERVAL, SHUTDOWN_GRACE,
};
use serde::{Deserialize, Serialize};

// ─── Sections ───────────────────────────────────────────────────────

/// Persisted log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path prefix; the UTC date and `.log` are appended.
    pub file_prefix: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_prefix: PathBuf::from(DEFAULT_FILE_PREFIX),
        }
    }
}

/// Monitor point bus and broadcast server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Path prefix; the UTC date and `.mp` are appended.
    pub file_prefix: PathBuf,
    /// Broadcast listen address.
    pub bind: String,
    /// Ingest depth that triggers a warning.
    pub ingest_warn_depth: usize,
    /// Longest idle wait of the bus loop before it re-checks the date (ms).
    pub idle_wait_ms: u64,
    /// Lines a subscriber may fall behind before it is disconnected.
    pub subscriber_backlog: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            file_prefix: PathBuf::from(DEFAULT_FILE_PREFIX),
            bind: MONITOR_BIND.to_string(),
            ingest_warn_depth: 10_000,
            idle_wait_ms: 100,
            subscriber_backlog: 1024,
        }
    }
}

impl MonitorConfig {
    /// Idle wait as a duration.
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}

/// Command distribution server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Command server listen address.
    pub bind: String,
    /// Depth of each per-antenna command queue.
    pub queue_depth: usize,
    /// Read commands from stdin as well.
    pub console: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            bind: COMMAND_BIND.to_string(),
            queue_depth: ANT_CMD_Q_DEPTH,
            console: true,
        }
    }
}

/// Antenna hardware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Registered driver name.
    pub driver: String,
    /// Number of antennas, numbered from 1.
    pub antennas: u16,
    /// Poll period of every motion controller (ms).
    pub polling_interval_ms: u64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            driver: "simulation".to_string(),
            antennas: NUM_ANTENNAS,
            polling_interval_ms: POLLING_INTERVAL.as_millis() as u64,
        }
    }
}

impl HardwareConfig {
    /// Poll period as a duration.
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

/// Closed-loop elevation moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Give up on a move after this long (s).
    pub timeout_s: f64,
    /// A move is complete once within this many degrees of target.
    pub acquisition_window_deg: f64,
    /// Nominal slew rate (deg/min), used for the expected-duration estimate.
    pub drive_rate_deg_per_min: f64,
    /// Control loop period during a move (ms).
    pub sub_tick_ms: u64,
    /// Lowest commandable elevation (deg).
    pub min_elevation_deg: f64,
    /// Highest commandable elevation (deg).
    pub max_elevation_deg: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            timeout_s: 60.0,
            acquisition_window_deg: 0.1,
            drive_rate_deg_per_min: 40.0,
            sub_tick_ms: 100,
            min_elevation_deg: 0.0,
            max_elevation_deg: 180.0,
        }
    }
}

impl MotionConfig {
    /// Move timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_s)
    }

    /// Control loop period as a duration.
    pub fn sub_tick(&self) -> Duration {
        Duration::from_millis(self.sub_tick_ms)
    }

    /// Whether an elevation is inside the commandable range.
    pub fn in_range(&self, elevation: f64) -> bool {
        (self.min_elevation_deg..=self.max_elevation_deg).contains(&elevation)
    }
}

/// Ordered shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Delay after the controllers stop, before the servers are torn down (ms).
    pub grace_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_ms: SHUTDOWN_GRACE.as_millis() as u64,
        }
    }
}

impl ShutdownConfig {
    /// Grace delay as a duration.
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

// ─── Root ───────────────────────────────────────────────────────────

/// Complete fabric configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    pub shared: SharedConfig,
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
    pub command: CommandConfig,
    pub hardware: HardwareConfig,
    pub motion: MotionConfig,
    pub shutdown: ShutdownConfig,
}

impl FabricConfig {
    /// Load and validate a configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.command.queue_depth == 0 {
            return Err(invalid("command.queue_depth must be at least 1"));
        }
        if self.hardware.antennas == 0 {
            return Err(invalid("hardware.antennas must be at least 1"));
        }
        if self.hardware.driver.is_empty() {
            return Err(invalid("hardware.driver cannot be empty"));
        }
        if self.hardware.polling_interval_ms == 0 {
            return Err(invalid("hardware.polling_interval_ms must be positive"));
        }
        if self.monitor.idle_wait_ms == 0 {
            return Err(invalid("monitor.idle_wait_ms must be positive"));
        }
        if self.monitor.subscriber_backlog == 0 {
            return Err(invalid("monitor.subscriber_backlog must be at least 1"));
        }
        if self.motion.sub_tick_ms == 0 {
            return Err(invalid("motion.sub_tick_ms must be positive"));
        }
        if !(self.motion.timeout_s > 0.0 && self.motion.timeout_s.is_finite()) {
            return Err(invalid("motion.timeout_s must be positive"));
        }
        if !(self.motion.acquisition_window_deg > 0.0) {
            return Err(invalid("motion.acquisition_window_deg must be positive"));
        }
        if !(self.motion.drive_rate_deg_per_min > 0.0) {
            return Err(invalid("motion.drive_rate_deg_per_min must be positive"));
        }
        if !(self.motion.min_elevation_deg < self.motion.max_elevation_deg) {
            return Err(invalid(
                "motion.min_elevation_deg must be below motion.max_elevation_deg",
            ));
        }

        let monitor = parse_bind("monitor.bind", &self.monitor.bind)?;
        let command = parse_bind("command.bind", &self.command.bind)?;
        if monitor.port() != 0 && monitor.port() == command.port() {
            return Err(invalid(format!(
                "monitor.bind and command.bind share port {}",
                monitor.port()
            )));
        }
        Ok(())
    }
}

fn parse_bind(field: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|e| invalid(format!("{field} '{value}': {e}")))
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}
