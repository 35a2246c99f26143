//! Monitor-point records and timestamps.
//!
//! A motion controller publishes one [`MonitorPointSet`] per poll tick; the
//! monitor bus expands it into one [`MonitorPointRecord`] per point, each
//! encoded as a CSV line `<mjd>,<source>,<point>,<value>`.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::sync::Arc;

/// MJD of the Unix epoch.
const MJD_UNIX_EPOCH: f64 = 40_587.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Modified Julian Date, rounded to microdays.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Mjd(f64);

impl Mjd {
    /// Wrap a raw MJD value.
    pub const fn from_days(days: f64) -> Self {
        Self(days)
    }

    /// Current time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert a UTC instant, rounding to 6 decimal places.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let secs = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) * 1e-9;
        let days = secs / SECONDS_PER_DAY + MJD_UNIX_EPOCH;
        Self((days * 1e6).round() / 1e6)
    }

    /// Raw value in days.
    #[inline]
    pub const fn days(self) -> f64 {
        self.0
    }

    /// UTC instant of this timestamp.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = (self.0 - MJD_UNIX_EPOCH) * SECONDS_PER_DAY;
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    }

    /// UTC calendar date of this timestamp.
    pub fn date(self) -> Option<NaiveDate> {
        self.to_datetime().map(|at| at.date_naive())
    }
}

impl fmt::Display for Mjd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Value of one monitor point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorValue {
    /// Scaled analog measurement.
    Float(f64),
    /// Discrete status or enumeration code.
    Int(i64),
    /// Boolean flag, encoded `0` / `1`.
    Bool(bool),
}

impl fmt::Display for MonitorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the trailing ".0" on whole numbers.
            MonitorValue::Float(v) => write!(f, "{v:?}"),
            MonitorValue::Int(v) => write!(f, "{v}"),
            MonitorValue::Bool(v) => write!(f, "{}", u8::from(*v)),
        }
    }
}

impl From<f64> for MonitorValue {
    fn from(v: f64) -> Self {
        MonitorValue::Float(v)
    }
}

impl From<i64> for MonitorValue {
    fn from(v: i64) -> Self {
        MonitorValue::Int(v)
    }
}

impl From<bool> for MonitorValue {
    fn from(v: bool) -> Self {
        MonitorValue::Bool(v)
    }
}

/// A single immutable monitor-point sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorPointRecord {
    /// Sample time.
    pub timestamp: Mjd,
    /// Source name, e.g. `ant12`.
    pub source: Arc<str>,
    /// Point name, e.g. `ant_el`.
    pub point: &'static str,
    /// Sampled value.
    pub value: MonitorValue,
}

impl MonitorPointRecord {
    /// Encode as a newline-terminated CSV line.
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{}\n",
            self.timestamp, self.source, self.point, self.value
        )
    }
}

/// All points sampled by one source in one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorPointSet {
    /// Sample time shared by every point.
    pub timestamp: Mjd,
    /// Source name.
    pub source: Arc<str>,
    /// Point name and value pairs, in publication order.
    pub points: Vec<(&'static str, MonitorValue)>,
}

impl MonitorPointSet {
    /// Expand into individual records.
    pub fn records(&self) -> impl Iterator<Item = MonitorPointRecord> + '_ {
        self.points.iter().map(|&(point, value)| MonitorPointRecord {
            timestamp: self.timestamp,
            source: Arc::clone(&self.source),
            point,
            value,
        })
    }

    /// Number of points in the set.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the set carries no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
