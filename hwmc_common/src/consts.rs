//! System-wide constants for the monitor & control workspace.
//!
//! Single source of truth for default limits, ports and file names.

use std::time::Duration;

/// Number of antennas in the full array.
pub const NUM_ANTENNAS: u16 = 110;

/// Default depth of each per-antenna command queue.
pub const ANT_CMD_Q_DEPTH: usize = 5;

/// Default hardware polling interval.
pub const POLLING_INTERVAL: Duration = Duration::from_secs(1);

/// Default monitor-point broadcast address.
pub const MONITOR_BIND: &str = "127.0.0.1:50000";

/// Default command server address.
pub const COMMAND_BIND: &str = "127.0.0.1:50001";

/// Default prefix for the persisted monitor-point and log files.
pub const DEFAULT_FILE_PREFIX: &str = "dsa-110-test-";

/// Extension of the persisted monitor-point file.
pub const MP_FILE_EXTENSION: &str = "mp";

/// Extension of the persisted log file.
pub const LOG_FILE_EXTENSION: &str = "log";

/// Offset between 0 °C and 0 K.
pub const ABSOLUTE_ZERO: f64 = 273.15;

/// Temperature reported before the first successful read (°C).
pub const TEMPERATURE_SENTINEL: f64 = -ABSOLUTE_ZERO;

/// Default grace delay between shutdown stages.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
