//! Per-connection broadcast filters.
//!
//! A subscriber sends lines `<source>,<point>`; it then receives exactly the
//! records whose source and point both match one of its filters, compared
//! case-insensitively. No filters, no data.

use std::str::FromStr;

use thiserror::Error;

/// Malformed subscription line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("expected '<source>,<point>', got '{0}'")]
    Malformed(String),
    #[error("empty source or point in '{0}'")]
    EmptyField(String),
}

/// One `(source, point)` pair, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    source: String,
    point: String,
}

impl Filter {
    /// Build a filter from its two keys.
    pub fn new(source: &str, point: &str) -> Self {
        Self {
            source: source.trim().to_ascii_lowercase(),
            point: point.trim().to_ascii_lowercase(),
        }
    }

    /// Whether a record with these keys passes.
    pub fn matches(&self, source: &str, point: &str) -> bool {
        self.source.eq_ignore_ascii_case(source) && self.point.eq_ignore_ascii_case(point)
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let mut fields = line.split(',');
        let (Some(source), Some(point), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(FilterError::Malformed(line.to_string()));
        };
        if source.trim().is_empty() || point.trim().is_empty() {
            return Err(FilterError::EmptyField(line.to_string()));
        }
        Ok(Filter::new(source, point))
    }
}

/// Accumulated filters of one connection.
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    filters: Vec<Filter>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; returns `false` if it was already present.
    pub fn add(&mut self, filter: Filter) -> bool {
        if self.filters.contains(&filter) {
            return false;
        }
        self.filters.push(filter);
        true
    }

    /// Whether any filter accepts the record keys.
    pub fn matches(&self, source: &str, point: &str) -> bool {
        self.filters.iter().any(|f| f.matches(source, point))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
