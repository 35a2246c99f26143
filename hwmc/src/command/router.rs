//! Routing of operator command lines to antenna queues.
//!
//! Shared by the console and the TCP server. Nothing is validated beyond the
//! target token: a line that names no known antenna is dropped without
//! feedback, and verbs are checked by the controller that receives them.

use std::collections::BTreeMap;
use std::sync::Arc;

use hwmc_common::antenna::AntennaId;
use hwmc_common::command::{Command, CommandLine, TargetSelector};
use hwmc_common::shutdown::Shutdown;
use tracing::{debug, info};

use crate::queue::CommandQueue;

/// What a routed line did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Global shutdown requested (or already under way).
    Shutdown,
    /// Enqueued on this many antenna queues.
    Queued(usize),
    /// Dropped: blank, unknown target, or intake already stopped.
    Discarded,
}

/// Maps target selectors to per-antenna command queues.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    queues: Arc<BTreeMap<AntennaId, Arc<CommandQueue>>>,
    stop: Shutdown,
}

impl CommandRouter {
    /// `stop` is triggered by a `stop` line; after that every line is
    /// discarded.
    pub fn new<I>(queues: I, stop: Shutdown) -> Self
    where
        I: IntoIterator<Item = (AntennaId, Arc<CommandQueue>)>,
    {
        Self {
            queues: Arc::new(queues.into_iter().collect()),
            stop,
        }
    }

    /// Queue of one antenna.
    pub fn queue(&self, antenna: AntennaId) -> Option<&Arc<CommandQueue>> {
        self.queues.get(&antenna)
    }

    /// Known antennas in ascending order.
    pub fn antennas(&self) -> impl Iterator<Item = AntennaId> + '_ {
        self.queues.keys().copied()
    }

    /// Parse and route one line. May block while a target queue is full.
    pub fn route(&self, line: &str) -> RouteOutcome {
        match CommandLine::parse(line) {
            CommandLine::Stop => {
                if self.stop.trigger() {
                    info!("Stop requested, shutting down");
                } else {
                    debug!("Stop already requested");
                }
                RouteOutcome::Shutdown
            }
            CommandLine::Incomplete => RouteOutcome::Discarded,
            CommandLine::Targeted { target, command } => {
                if self.stop.is_triggered() {
                    debug!("Intake stopped, discarding '{target} {command}'");
                    return RouteOutcome::Discarded;
                }
                match TargetSelector::parse(&target) {
                    Some(TargetSelector::All | TargetSelector::Broadcast) => {
                        self.fan_out(&command)
                    }
                    Some(TargetSelector::Antenna(id)) => match self.queues.get(&id) {
                        Some(queue) => self.enqueue(id, queue, command),
                        None => {
                            debug!("No antenna {id}, discarding '{command}'");
                            RouteOutcome::Discarded
                        }
                    },
                    None => {
                        debug!("Invalid target '{target}', discarding '{command}'");
                        RouteOutcome::Discarded
                    }
                }
            }
        }
    }

    fn fan_out(&self, command: &Command) -> RouteOutcome {
        let mut queued = 0;
        for (&id, queue) in self.queues.iter() {
            if let RouteOutcome::Queued(n) = self.enqueue(id, queue, command.clone()) {
                queued += n;
            }
        }
        if queued == 0 {
            RouteOutcome::Discarded
        } else {
            RouteOutcome::Queued(queued)
        }
    }

    fn enqueue(&self, id: AntennaId, queue: &CommandQueue, command: Command) -> RouteOutcome {
        debug!("Ant {id}: queueing '{command}'");
        match queue.push(command) {
            Ok(()) => RouteOutcome::Queued(1),
            Err(e) => {
                debug!("Ant {id}: {e}");
                RouteOutcome::Discarded
            }
        }
    }
}
