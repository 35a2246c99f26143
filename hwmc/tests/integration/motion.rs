use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hwmc::bus::BusHandle;
use hwmc::config::MotionConfig;
use hwmc::motion::{ControllerSettings, MotionController, MoveOutcome};
use hwmc::queue::CommandQueue;
use hwmc_common::antenna::AntennaId;
use hwmc_common::command::Command;
use hwmc_common::hal::driver::{AntennaDriver, DriverError};
use hwmc_common::hal::types::{DigitalOutput, DriveState, OutputWrite, RawFrame};
use hwmc_common::monitor::{MonitorPointSet, MonitorValue};
use hwmc_common::shutdown::Shutdown;
use parking_lot::Mutex;

use super::support::{StuckDriver, ant, fast_simulation};

/// Simulated antenna that also records what was written to it.
struct Recording {
    inner: Box<dyn AntennaDriver>,
    writes: Arc<Mutex<Vec<OutputWrite>>>,
}

impl AntennaDriver for Recording {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn init(&mut self) -> Result<(), DriverError> {
        self.inner.init()
    }

    fn read_frame(&mut self) -> Result<RawFrame, DriverError> {
        self.inner.read_frame()
    }

    fn write_outputs(&mut self, writes: &[OutputWrite]) -> Result<(), DriverError> {
        self.writes.lock().extend_from_slice(writes);
        self.inner.write_outputs(writes)
    }
}

fn settings(timeout_s: f64) -> ControllerSettings {
    ControllerSettings {
        polling_interval: Duration::from_millis(50),
        motion: MotionConfig {
            timeout_s,
            sub_tick_ms: 10,
            drive_rate_deg_per_min: 600.0,
            ..MotionConfig::default()
        },
    }
}

fn simulated(
    id: AntennaId,
    timeout_s: f64,
) -> (
    MotionController,
    Arc<Mutex<Vec<OutputWrite>>>,
    flume::Receiver<MonitorPointSet>,
) {
    let mut inner = fast_simulation(id);
    inner.init().unwrap();
    let writes = Arc::new(Mutex::new(Vec::new()));
    let driver = Recording {
        inner,
        writes: Arc::clone(&writes),
    };
    let (bus, rx) = BusHandle::channel();
    let ctrl = MotionController::new(
        id,
        Box::new(driver),
        Arc::new(CommandQueue::new(5)),
        bus,
        settings(timeout_s),
        Shutdown::new(),
    );
    (ctrl, writes, rx)
}

fn published_elevation(set: &MonitorPointSet) -> f64 {
    match set.points.iter().find(|(name, _)| *name == "ant_el") {
        Some((_, MonitorValue::Float(v))) => *v,
        other => panic!("no elevation in set: {other:?}"),
    }
}

#[test]
fn move_acquires_target_then_parks() {
    let (mut ctrl, writes, rx) = simulated(ant(2), 10.0);
    let outcome = ctrl.execute(&Command::new("move", ["45"])).unwrap();
    assert_eq!(outcome, Some(MoveOutcome::Acquired));

    assert!(ctrl.poll());
    let snapshot = ctrl.snapshot();
    assert!((snapshot.ant_el - 45.0).abs() <= 0.2, "{}", snapshot.ant_el);
    assert!(snapshot.brake);
    assert_eq!(snapshot.drive_state, DriveState::Off);

    let writes = writes.lock();
    // The first drive command points up, the last two writes park the axis.
    let first_drive = writes
        .iter()
        .find(|(line, _)| *line == DigitalOutput::DriveA || *line == DigitalOutput::DriveB)
        .copied();
    assert_eq!(first_drive, Some((DigitalOutput::DriveA, false)));
    let tail = &writes[writes.len() - 3..];
    assert_eq!(
        tail,
        &[
            (DigitalOutput::DriveA, true),
            (DigitalOutput::DriveB, true),
            (DigitalOutput::Brake, true),
        ]
    );

    let last = rx.try_iter().last().unwrap();
    assert!((published_elevation(&last) - 45.0).abs() <= 0.2);
}

#[test]
fn move_down_acquires_target() {
    let (mut ctrl, _writes, _rx) = simulated(ant(9), 10.0);
    let outcome = ctrl.execute(&Command::new("move", ["30.5"])).unwrap();
    assert_eq!(outcome, Some(MoveOutcome::Acquired));
    assert!((ctrl.snapshot().ant_el - 30.5).abs() <= 0.2);
}

#[test]
fn stuck_axis_times_out_with_brake_engaged() {
    let driver = StuckDriver::default();
    let writes = Arc::clone(&driver.writes);
    let (bus, _rx) = BusHandle::channel();
    let mut ctrl = MotionController::new(
        ant(4),
        Box::new(driver),
        Arc::new(CommandQueue::new(5)),
        bus,
        settings(0.3),
        Shutdown::new(),
    );
    assert_eq!(ctrl.slew_to(60.0), MoveOutcome::TimedOut);
    assert_eq!(writes.lock().last(), Some(&(DigitalOutput::Brake, true)));
}

#[test]
fn controller_thread_executes_queued_move() {
    let id = ant(5);
    let mut driver = fast_simulation(id);
    driver.init().unwrap();
    let queue = Arc::new(CommandQueue::new(5));
    let (bus, rx) = BusHandle::channel();
    let shutdown = Shutdown::new();
    let ctrl = MotionController::new(
        id,
        driver,
        Arc::clone(&queue),
        bus,
        settings(10.0),
        shutdown.clone(),
    );
    let handle = thread::spawn(move || ctrl.run());

    queue.push(Command::new("move", ["42"])).unwrap();
    let mut reached = false;
    while let Ok(set) = rx.recv_timeout(Duration::from_secs(5)) {
        assert_eq!(&*set.source, "ant5");
        if (published_elevation(&set) - 42.0).abs() <= 0.2 {
            reached = true;
            break;
        }
    }
    assert!(reached);

    shutdown.trigger();
    queue.close();
    handle.join().unwrap();
}
