//! Operator command lines and target selectors.
//!
//! Wire format (console and TCP): `<target> <verb> [args...]` or
//! `<verb> <target> [args...]`, lower-cased and split on whitespace. A verb is
//! never a valid target token, so the order is decided by whether the first
//! token parses as a [`TargetSelector`]. A line whose first token is `stop`
//! requests a global shutdown.

use crate::antenna::AntennaId;
use std::fmt;

/// Reserved first token that requests global shutdown.
pub const STOP_TOKEN: &str = "stop";

/// A command as delivered to an antenna's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Verb, e.g. `move`.
    pub verb: String,
    /// Remaining arguments in order.
    pub args: Vec<String>,
}

impl Command {
    /// Build a command from a verb and its arguments.
    pub fn new<V, I, A>(verb: V, args: I) -> Self
    where
        V: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            verb: verb.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// True for `move stop` / `move off`, which may cut a running move short.
    pub fn is_motion_halt(&self) -> bool {
        self.verb == "move"
            && matches!(self.args.as_slice(), [arg] if arg == "stop" || arg == "off")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Which antennas a command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// `all`: every antenna.
    All,
    /// `0`: every antenna.
    Broadcast,
    /// One antenna by identifier.
    Antenna(AntennaId),
}

impl TargetSelector {
    /// Parse a selector token; `None` for anything unrecognised.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "all" => Some(TargetSelector::All),
            "0" => Some(TargetSelector::Broadcast),
            other => other.parse().ok().map(TargetSelector::Antenna),
        }
    }
}

/// Result of parsing one operator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Global shutdown request.
    Stop,
    /// A command with its (unvalidated) target token.
    Targeted {
        /// Raw target token, resolved by the router.
        target: String,
        /// Command to enqueue.
        command: Command,
    },
    /// Blank line or a single token.
    Incomplete,
}

impl CommandLine {
    /// Lower-case and tokenize one line of operator input, in either token
    /// order.
    pub fn parse(line: &str) -> Self {
        let lowered = line.trim().to_lowercase();
        let mut tokens = lowered.split_whitespace();

        let Some(first) = tokens.next() else {
            return CommandLine::Incomplete;
        };
        if first == STOP_TOKEN {
            return CommandLine::Stop;
        }
        let Some(second) = tokens.next() else {
            return CommandLine::Incomplete;
        };

        let (target, verb) = if TargetSelector::parse(first).is_some() {
            (first, second)
        } else {
            (second, first)
        };
        CommandLine::Targeted {
            target: target.to_string(),
            command: Command::new(verb, tokens),
        }
    }
}
