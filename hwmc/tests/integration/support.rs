//! Shared fixtures.

use std::io::{BufRead, BufReader};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hwmc::queue::CommandQueue;
use hwmc_common::antenna::AntennaId;
use hwmc_common::hal::consts::{ENCODER_OFFSET, ENCODER_SCALE};
use hwmc_common::hal::driver::{AntennaDriver, DriverError};
use hwmc_common::hal::types::{OutputWrite, RawFrame};
use hwmc_hal::drivers::simulation::{ElevationModel, SimulationDriver};
use parking_lot::Mutex;

pub fn ant(id: u16) -> AntennaId {
    AntennaId::new(id).unwrap()
}

/// One queue per antenna `1..=count`.
pub fn queues(count: u16, depth: usize) -> Vec<(AntennaId, Arc<CommandQueue>)> {
    (1..=count)
        .map(|id| (ant(id), Arc::new(CommandQueue::new(depth))))
        .collect()
}

/// Simulated antenna at 40 deg that slews at 10 deg/s.
pub fn fast_simulation(antenna: AntennaId) -> Box<dyn AntennaDriver> {
    Box::new(SimulationDriver::with_model(
        antenna,
        ElevationModel::new(40.0, 600.0, 0.0, 180.0),
    ))
}

/// Antenna that never moves from 40 deg and records every write.
#[derive(Clone, Default)]
pub struct StuckDriver {
    pub writes: Arc<Mutex<Vec<OutputWrite>>>,
}

impl AntennaDriver for StuckDriver {
    fn name(&self) -> &'static str {
        "stuck"
    }

    fn init(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn read_frame(&mut self) -> Result<RawFrame, DriverError> {
        let mut frame = RawFrame::default();
        frame.analog[0] = (40.0 - ENCODER_OFFSET) / ENCODER_SCALE;
        Ok(frame)
    }

    fn write_outputs(&mut self, writes: &[OutputWrite]) -> Result<(), DriverError> {
        self.writes.lock().extend_from_slice(writes);
        Ok(())
    }
}

/// Poll `cond` every 10 ms until it holds or `timeout` passes.
pub fn eventually<F: FnMut() -> bool>(timeout: Duration, mut cond: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}

/// Line reader over a subscriber connection with a read timeout.
pub fn subscriber_reader(stream: &TcpStream) -> BufReader<TcpStream> {
    let stream = stream.try_clone().unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    BufReader::new(stream)
}

/// Next line, or `None` on timeout or EOF.
pub fn next_line(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end().to_string()),
    }
}
