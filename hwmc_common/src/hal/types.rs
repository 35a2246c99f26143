//! HAL frame and digital-line types.
//!
//! This module defines the data exchanged with an antenna driver:
//! - `RawFrame` - One batch read of all monitored channels
//! - `DioStatus` - Packed digital state word
//! - `DigitalOutput` / `OutputWrite` - Writable digital lines
//! - `DriveCommand` / `DriveState` - Motor drive encoding and decoding

use crate::hal::consts::{DRIVE_STATUS_SHIFT, NUM_ANALOG};
use bitflags::bitflags;
use std::fmt;

/// One batch read of an antenna controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrame {
    /// Analog inputs `AIN0..AIN13` in volts.
    pub analog: [f64; NUM_ANALOG],
    /// Controller board temperature in kelvin.
    pub device_temp_k: f64,
    /// Packed digital state word (`DIO_STATE`).
    pub dio_state: u32,
}

impl Default for RawFrame {
    fn default() -> Self {
        Self {
            analog: [0.0; NUM_ANALOG],
            device_temp_k: 0.0,
            dio_state: 0,
        }
    }
}

impl RawFrame {
    /// Digital state word as flags.
    #[inline]
    pub fn dio(&self) -> DioStatus {
        DioStatus::from_bits_retain(self.dio_state)
    }
}

bitflags! {
    /// Bits of the packed digital state word.
    ///
    /// Noise diode bits are active low: a cleared bit means the diode is on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DioStatus: u32 {
        /// Drive status, low bit.
        const DRIVE_0     = 1 << 8;
        /// Drive status, high bit.
        const DRIVE_1     = 1 << 9;
        /// Brake engaged.
        const BRAKE       = 1 << 16;
        /// Plus limit switch.
        const PLUS_LIMIT  = 1 << 17;
        /// Minus limit switch.
        const MINUS_LIMIT = 1 << 18;
        /// Polarization A noise diode line (active low).
        const ND_A        = 1 << 20;
        /// Polarization B noise diode line (active low).
        const ND_B        = 1 << 21;
        /// Fan error.
        const FAN_ERR     = 1 << 22;
    }
}

impl DioStatus {
    /// The two drive status bits as a number `0..=3`.
    #[inline]
    pub const fn drive_bits(&self) -> u8 {
        ((self.bits() >> DRIVE_STATUS_SHIFT) & 0b11) as u8
    }

    /// Replace the two drive status bits.
    pub fn with_drive_bits(self, bits: u8) -> Self {
        let cleared = self.difference(Self::DRIVE_0 | Self::DRIVE_1);
        Self::from_bits_retain(cleared.bits() | (u32::from(bits & 0b11) << DRIVE_STATUS_SHIFT))
    }
}

/// Writable digital lines of an antenna controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalOutput {
    /// Elevation brake (high = engaged).
    Brake,
    /// Polarization A noise diode (low = on).
    NoiseDiodeA,
    /// Polarization B noise diode (low = on).
    NoiseDiodeB,
    /// First motor drive line.
    DriveA,
    /// Second motor drive line.
    DriveB,
}

/// A single line level to write; `true` is logic high.
pub type OutputWrite = (DigitalOutput, bool);

/// Commanded motor direction.
///
/// The drive lines are active low and mutually exclusive: never are both
/// pulled low at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriveCommand {
    /// Both lines high, motor de-energized.
    #[default]
    Off,
    /// Drive toward higher elevation.
    Up,
    /// Drive toward lower elevation.
    Down,
}

impl DriveCommand {
    /// Line levels `(DriveA, DriveB)` for this command.
    pub const fn levels(self) -> (bool, bool) {
        match self {
            DriveCommand::Off => (true, true),
            DriveCommand::Up => (false, true),
            DriveCommand::Down => (true, false),
        }
    }

    /// Both line writes, to be issued as one batch.
    pub const fn writes(self) -> [OutputWrite; 2] {
        let (a, b) = self.levels();
        [(DigitalOutput::DriveA, a), (DigitalOutput::DriveB, b)]
    }

    /// Direction that reduces a positioning error of the given sign.
    pub fn toward(error: f64) -> Self {
        if error > 0.0 {
            DriveCommand::Up
        } else if error < 0.0 {
            DriveCommand::Down
        } else {
            DriveCommand::Off
        }
    }
}

/// Motor status reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriveState {
    /// Not driving.
    #[default]
    Off,
    /// Driving up.
    Up,
    /// Driving down.
    Down,
    /// Both directions asserted: fault.
    Bad,
}

impl DriveState {
    /// Decode the two drive status bits.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => DriveState::Off,
            1 => DriveState::Up,
            2 => DriveState::Down,
            _ => DriveState::Bad,
        }
    }

    /// Numeric code as published on the monitor stream.
    pub const fn code(self) -> u8 {
        match self {
            DriveState::Off => 0,
            DriveState::Up => 1,
            DriveState::Down => 2,
            DriveState::Bad => 3,
        }
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriveState::Off => "Off",
            DriveState::Up => "Up",
            DriveState::Down => "Down",
            DriveState::Bad => "Bad",
        };
        f.write_str(s)
    }
}
