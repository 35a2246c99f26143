//! Antenna identifiers.

use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;

/// Identifier of one antenna; always a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AntennaId(NonZeroU16);

impl AntennaId {
    /// Create an identifier, rejecting zero.
    pub const fn new(id: u16) -> Option<Self> {
        match NonZeroU16::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Numeric value.
    #[inline]
    pub const fn get(self) -> u16 {
        self.0.get()
    }

    /// Monitor-point source name, e.g. `ant12`.
    pub fn source_name(self) -> String {
        format!("ant{}", self.0)
    }
}

impl fmt::Display for AntennaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AntennaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU16>().map(Self)
    }
}
