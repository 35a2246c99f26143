//! Antenna command verbs.
//!
//! A queued [`Command`] is validated here, inside the controller, not at the
//! transport layer.

use hwmc_common::command::Command;
use thiserror::Error;

/// Operator help, logged for `help` and for unknown verbs.
pub const HELP_TEXT: &str = "Available commands:
\thelp:\t\tGives this help
\tmove arg:\tmove the antenna
\t\t\t\targ = up|down|stop|<angle>
\tnd pol state:\tswitch noise diode
\t\t\t\tpol = a|b|ab, state = on|off
\tbrake arg:\tswitch the elevation brake
\t\t\t\targ = on|off";

/// Rejected antenna command. Logged, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("'{verb}' takes {expected} argument(s), got {got}")]
    ArgumentCount {
        verb: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument for 'move': {0}. Should be up|down|stop|<angle>")]
    InvalidMoveTarget(String),

    #[error("target elevation {target} deg outside [{min}, {max}]")]
    OutOfRange { target: f64, min: f64, max: f64 },

    #[error("invalid noise diode polarization requested: {0}")]
    InvalidPolarization(String),

    #[error("invalid noise diode state requested: {0}")]
    InvalidDiodeState(String),

    #[error("invalid brake state requested: {0}")]
    InvalidBrakeState(String),
}

/// Open-loop `move` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jog {
    Up,
    Down,
    /// `stop` or `off`.
    Stop,
}

/// Argument of `move`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveTarget {
    Jog(Jog),
    /// Closed-loop move to an elevation (deg).
    Angle(f64),
}

/// Noise diode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarization {
    A,
    B,
    /// `ab` or `both`.
    Both,
}

impl Polarization {
    fn parse(token: &str) -> Result<Self, CommandError> {
        match token {
            "a" => Ok(Polarization::A),
            "b" => Ok(Polarization::B),
            "ab" | "both" => Ok(Polarization::Both),
            other => Err(CommandError::InvalidPolarization(other.to_string())),
        }
    }

    /// Human-readable name for log messages.
    pub const fn describe(self) -> &'static str {
        match self {
            Polarization::A => "polarization a",
            Polarization::B => "polarization b",
            Polarization::Both => "both polarizations",
        }
    }
}

/// A validated antenna command.
#[derive(Debug, Clone, PartialEq)]
pub enum AntennaCommand {
    Help,
    Move(MoveTarget),
    /// `true` engages the brake.
    Brake(bool),
    NoiseDiode { polarization: Polarization, on: bool },
    /// Unrecognised verb; answered with the help text.
    Unknown(String),
}

impl AntennaCommand {
    /// Validate a queued command.
    pub fn parse(command: &Command) -> Result<Self, CommandError> {
        let args = command.args.as_slice();
        match command.verb.as_str() {
            "help" => Ok(AntennaCommand::Help),
            "move" => {
                let [arg] = args else {
                    return Err(arg_count("move", 1, args.len()));
                };
                parse_move_target(arg).map(AntennaCommand::Move)
            }
            "brake" => {
                let [arg] = args else {
                    return Err(arg_count("brake", 1, args.len()));
                };
                match arg.as_str() {
                    "on" => Ok(AntennaCommand::Brake(true)),
                    "off" => Ok(AntennaCommand::Brake(false)),
                    other => Err(CommandError::InvalidBrakeState(other.to_string())),
                }
            }
            "nd" | "noise" | "noisediode" => {
                let [pol, state] = args else {
                    return Err(arg_count("nd", 2, args.len()));
                };
                let on = match state.as_str() {
                    "on" => true,
                    "off" => false,
                    other => return Err(CommandError::InvalidDiodeState(other.to_string())),
                };
                Ok(AntennaCommand::NoiseDiode {
                    polarization: Polarization::parse(pol)?,
                    on,
                })
            }
            other => Ok(AntennaCommand::Unknown(other.to_string())),
        }
    }
}

fn parse_move_target(arg: &str) -> Result<MoveTarget, CommandError> {
    match arg {
        "up" => Ok(MoveTarget::Jog(Jog::Up)),
        "down" => Ok(MoveTarget::Jog(Jog::Down)),
        "stop" | "off" => Ok(MoveTarget::Jog(Jog::Stop)),
        other => match other.parse::<f64>() {
            Ok(angle) if angle.is_finite() => Ok(MoveTarget::Angle(angle)),
            _ => Err(CommandError::InvalidMoveTarget(other.to_string())),
        },
    }
}

fn arg_count(verb: &'static str, expected: usize, got: usize) -> CommandError {
    CommandError::ArgumentCount {
        verb,
        expected,
        got,
    }
}
