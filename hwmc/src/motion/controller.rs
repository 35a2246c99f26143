//! Per-antenna motion controller.
//!
//! One controller per antenna, each on its own thread. It polls the hardware
//! every interval, publishes the snapshot to the monitor bus and executes
//! queued commands in between. A closed-loop move blocks the thread until
//! the antenna is on target, the deadline passes, a queued `move stop`
//! arrives or the controller is shut down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hwmc_common::antenna::AntennaId;
use hwmc_common::command::Command;
use hwmc_common::hal::driver::{AntennaDriver, DriverError};
use hwmc_common::hal::types::{DigitalOutput, DriveCommand, DriveState, OutputWrite, RawFrame};
use hwmc_common::monitor::Mjd;
use hwmc_common::shutdown::Shutdown;
use tracing::{debug, error, info, warn};

use super::command::{AntennaCommand, CommandError, HELP_TEXT, Jog, MoveTarget, Polarization};
use super::snapshot::{MonitorSnapshot, encoder_elevation};
use crate::bus::BusHandle;
use crate::config::{FabricConfig, MotionConfig};
use crate::queue::CommandQueue;

/// How a closed-loop move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Within the acquisition window.
    Acquired,
    /// Deadline passed first.
    TimedOut,
    /// A queued `move stop` / `move off` cut it short.
    Interrupted,
    /// The controller is shutting down.
    Aborted,
}

/// Timing and motion parameters of a controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub polling_interval: Duration,
    pub motion: MotionConfig,
}

impl From<&FabricConfig> for ControllerSettings {
    fn from(config: &FabricConfig) -> Self {
        Self {
            polling_interval: config.hardware.polling_interval(),
            motion: config.motion.clone(),
        }
    }
}

/// Owns one antenna's driver and snapshot.
pub struct MotionController {
    antenna: AntennaId,
    source: Arc<str>,
    driver: Box<dyn AntennaDriver>,
    snapshot: MonitorSnapshot,
    queue: Arc<CommandQueue>,
    bus: BusHandle,
    settings: ControllerSettings,
    shutdown: Shutdown,
    /// Last commanded drive direction.
    commanded: DriveCommand,
    read_fault: bool,
    write_fault: bool,
    drive_fault: bool,
}

impl MotionController {
    pub fn new(
        antenna: AntennaId,
        driver: Box<dyn AntennaDriver>,
        queue: Arc<CommandQueue>,
        bus: BusHandle,
        settings: ControllerSettings,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            antenna,
            source: Arc::from(antenna.source_name()),
            driver,
            snapshot: MonitorSnapshot::default(),
            queue,
            bus,
            settings,
            shutdown,
            commanded: DriveCommand::Off,
            read_fault: false,
            write_fault: false,
            drive_fault: false,
        }
    }

    /// Antenna served by this controller.
    pub fn antenna(&self) -> AntennaId {
        self.antenna
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> &MonitorSnapshot {
        &self.snapshot
    }

    /// Last commanded drive direction.
    pub fn commanded(&self) -> DriveCommand {
        self.commanded
    }

    // ─── Hardware access ────────────────────────────────────────────

    /// Read all channels, update the snapshot and publish it.
    ///
    /// A failed read, or one with a non-finite elevation, leaves the
    /// snapshot as it was and publishes nothing; the failure is logged once
    /// until a read succeeds again.
    pub fn poll(&mut self) -> bool {
        let frame = match self.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                if !self.read_fault {
                    self.read_fault = true;
                    error!("Ant {}: hardware read failed: {e}", self.antenna);
                }
                return false;
            }
        };
        if self.read_fault {
            self.read_fault = false;
            info!("Ant {}: hardware reads recovered", self.antenna);
        }

        self.snapshot.update(&frame);
        self.check_drive_state();
        self.bus
            .post(self.snapshot.to_point_set(Mjd::now(), &self.source));
        true
    }

    fn read_frame(&mut self) -> Result<RawFrame, DriverError> {
        let frame = self.driver.read_frame()?;
        let elevation = encoder_elevation(frame.analog[0]);
        if !elevation.is_finite() {
            return Err(DriverError::Communication(format!(
                "elevation encoder reads {elevation}"
            )));
        }
        Ok(frame)
    }

    fn check_drive_state(&mut self) {
        let bad = self.snapshot.drive_state == DriveState::Bad;
        if bad && !self.drive_fault {
            error!(
                "Ant {}: drive reports {} (both directions asserted)",
                self.antenna,
                DriveState::Bad
            );
        } else if !bad && self.drive_fault {
            info!(
                "Ant {}: drive state cleared to {}",
                self.antenna, self.snapshot.drive_state
            );
        }
        self.drive_fault = bad;
    }

    fn write(&mut self, writes: &[OutputWrite]) -> bool {
        match self.driver.write_outputs(writes) {
            Ok(()) => {
                if self.write_fault {
                    self.write_fault = false;
                    info!("Ant {}: hardware writes recovered", self.antenna);
                }
                true
            }
            Err(e) => {
                if !self.write_fault {
                    self.write_fault = true;
                    error!("Ant {}: hardware write failed: {e}", self.antenna);
                }
                false
            }
        }
    }

    fn set_brake(&mut self, engaged: bool) {
        self.write(&[(DigitalOutput::Brake, engaged)]);
    }

    fn set_drive(&mut self, drive: DriveCommand) {
        // Both drive lines go out in one batch.
        self.write(&drive.writes());
        self.commanded = drive;
    }

    /// Motor off, then brake on.
    fn safe_stop(&mut self) {
        self.set_drive(DriveCommand::Off);
        self.set_brake(true);
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Validate and carry out one command.
    ///
    /// Returns the outcome of a closed-loop move, `None` for every other
    /// command. Rejected commands perform no hardware write.
    pub fn execute(&mut self, command: &Command) -> Result<Option<MoveOutcome>, CommandError> {
        debug!("Ant {}: executing '{command}'", self.antenna);
        match AntennaCommand::parse(command)? {
            AntennaCommand::Help => info!("{HELP_TEXT}"),
            AntennaCommand::Unknown(verb) => {
                info!("Ant {}: unknown command '{verb}'", self.antenna);
                info!("{HELP_TEXT}");
            }
            AntennaCommand::Move(MoveTarget::Angle(target)) => {
                let motion = &self.settings.motion;
                if !motion.in_range(target) {
                    return Err(CommandError::OutOfRange {
                        target,
                        min: motion.min_elevation_deg,
                        max: motion.max_elevation_deg,
                    });
                }
                return Ok(Some(self.slew_to(target)));
            }
            AntennaCommand::Move(MoveTarget::Jog(jog)) => self.jog(jog),
            AntennaCommand::Brake(engaged) => {
                info!(
                    "Ant {}: Turning brake {}",
                    self.antenna,
                    if engaged { "on" } else { "off" }
                );
                self.set_brake(engaged);
            }
            AntennaCommand::NoiseDiode { polarization, on } => {
                self.noise_diode(polarization, on);
            }
        }
        Ok(None)
    }

    /// Open-loop `move up|down|stop`.
    fn jog(&mut self, jog: Jog) {
        let drive = match jog {
            Jog::Up => DriveCommand::Up,
            Jog::Down => DriveCommand::Down,
            Jog::Stop => {
                info!("Ant {}: Stopping", self.antenna);
                self.safe_stop();
                return;
            }
        };
        info!("Ant {}: Moving {:?}", self.antenna, drive);
        self.set_brake(false);
        self.set_drive(drive);
    }

    fn noise_diode(&mut self, polarization: Polarization, on: bool) {
        // Diode lines are active low.
        let level = !on;
        info!(
            "Ant {}: Turning {} noise diode {}",
            self.antenna,
            polarization.describe(),
            if on { "on" } else { "off" }
        );
        match polarization {
            Polarization::A => self.write(&[(DigitalOutput::NoiseDiodeA, level)]),
            Polarization::B => self.write(&[(DigitalOutput::NoiseDiodeB, level)]),
            Polarization::Both => self.write(&[
                (DigitalOutput::NoiseDiodeA, level),
                (DigitalOutput::NoiseDiodeB, level),
            ]),
        };
    }

    /// Closed-loop move to `target` degrees.
    ///
    /// Always leaves the motor off and the brake engaged.
    pub fn slew_to(&mut self, target: f64) -> MoveOutcome {
        let motion = self.settings.motion.clone();
        self.poll();

        let distance = (target - self.snapshot.ant_el).abs();
        let expected_s = distance / motion.drive_rate_deg_per_min * 60.0;
        if expected_s.is_finite() {
            info!(
                "Ant {}: Moving antenna to {target} deg elevation (about {expected_s:.0} s)",
                self.antenna
            );
        } else {
            info!("Ant {}: Moving antenna to {target} deg elevation", self.antenna);
        }

        let deadline = Instant::now() + motion.timeout();
        self.set_brake(false);

        let outcome = loop {
            let error = target - self.snapshot.ant_el;
            if error.abs() <= motion.acquisition_window_deg {
                break MoveOutcome::Acquired;
            }
            if Instant::now() >= deadline {
                break MoveOutcome::TimedOut;
            }
            self.set_drive(DriveCommand::toward(error));
            if self.shutdown.wait_timeout(motion.sub_tick()) {
                break MoveOutcome::Aborted;
            }
            self.poll();
            if self.queue.take_first(Command::is_motion_halt).is_some() {
                break MoveOutcome::Interrupted;
            }
        };

        self.safe_stop();
        match outcome {
            MoveOutcome::Acquired => info!("Ant {}: Elevation acquired", self.antenna),
            MoveOutcome::TimedOut => error!(
                "Ant {}: Move timed out at {:.2} deg",
                self.antenna, self.snapshot.ant_el
            ),
            MoveOutcome::Interrupted => info!("Ant {}: Move stopped on request", self.antenna),
            MoveOutcome::Aborted => warn!("Ant {}: Move aborted by shutdown", self.antenna),
        }
        outcome
    }

    // ─── Thread loop ────────────────────────────────────────────────

    /// Poll and execute until the command queue is closed and drained.
    pub fn run(mut self) {
        info!("Antenna {} connected via {}", self.antenna, self.driver.name());
        let interval = self.settings.polling_interval;
        let mut next_poll = Instant::now();

        loop {
            self.poll();
            next_poll += interval;
            let now = Instant::now();
            if next_poll <= now {
                // Fell behind, e.g. after a long move.
                next_poll = now + interval;
            }

            while let Some(command) = self.queue.pop_until(next_poll) {
                if let Err(e) = self.execute(&command) {
                    error!("Ant {}: {e}", self.antenna);
                }
                if Instant::now() >= next_poll {
                    break;
                }
            }

            if self.queue.is_closed() && self.queue.is_empty() {
                break;
            }
        }

        if let Err(e) = self.driver.shutdown() {
            warn!("Ant {}: driver shutdown failed: {e}", self.antenna);
        }
        info!("Antenna {} disconnecting", self.antenna);
    }
}
