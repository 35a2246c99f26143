//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `AntennaDriver` trait to emulate an
//! antenna controller without physical hardware.

use super::physics::ElevationModel;
use hwmc_common::antenna::AntennaId;
use hwmc_common::consts::ABSOLUTE_ZERO;
use hwmc_common::hal::consts::{ENCODER_OFFSET, ENCODER_SCALE, NUM_ANALOG};
use hwmc_common::hal::driver::{AntennaDriver, DriverError};
use hwmc_common::hal::types::{DigitalOutput, DioStatus, DriveCommand, OutputWrite, RawFrame};
use std::time::Instant;
use tracing::{debug, info};

/// Fixed analog readings for everything except the encoder (volts).
const STATIC_ANALOG: [f64; NUM_ANALOG] = [
    0.0,  // AIN0: encoder, computed
    0.9,  // focus temperature, 20 °C
    0.5,  // LNA A current
    1.75, // RF A power, -40 dBm
    1.2,  // laser A
    0.25, // FEB A current
    0.9,  // FEB A temperature
    0.05, // LNA B current
    1.75, // RF B power
    1.2,  // laser B
    2.5,  // FEB B current
    0.9,  // FEB B temperature
    5.0,  // PSU
    0.0,  // unused
];

/// Board temperature (°C).
const BOARD_TEMP_C: f64 = 27.0;

/// Simulation driver implementing the AntennaDriver trait.
pub struct SimulationDriver {
    /// Antenna this instance stands in for
    antenna: AntennaId,
    /// Initialized flag
    initialized: bool,
    /// Elevation axis
    model: ElevationModel,
    /// Brake line level (high = engaged)
    brake: bool,
    /// Noise diode line levels (high = off)
    nd_a: bool,
    nd_b: bool,
    /// Drive line levels
    drive_a: bool,
    drive_b: bool,
    /// Time of the previous frame, for physics integration
    last_read: Option<Instant>,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new(antenna: AntennaId) -> Self {
        Self::with_model(antenna, ElevationModel::default())
    }

    /// Create a simulation driver around a given elevation model.
    pub fn with_model(antenna: AntennaId, model: ElevationModel) -> Self {
        Self {
            antenna,
            initialized: false,
            model,
            brake: true,
            nd_a: true,
            nd_b: true,
            drive_a: true,
            drive_b: true,
            last_read: None,
        }
    }

    /// Current simulated elevation (deg).
    pub fn elevation(&self) -> f64 {
        self.model.elevation()
    }

    /// Direction implied by the drive lines; both low moves nothing.
    fn drive(&self) -> DriveCommand {
        match (self.drive_a, self.drive_b) {
            (false, true) => DriveCommand::Up,
            (true, false) => DriveCommand::Down,
            _ => DriveCommand::Off,
        }
    }

    fn dio_state(&self) -> DioStatus {
        let mut dio = DioStatus::empty();
        dio.set(DioStatus::BRAKE, self.brake);
        dio.set(DioStatus::PLUS_LIMIT, !self.model.at_plus_limit());
        dio.set(DioStatus::MINUS_LIMIT, !self.model.at_minus_limit());
        dio.set(DioStatus::ND_A, self.nd_a);
        dio.set(DioStatus::ND_B, self.nd_b);
        // Drive status mirrors the active-low drive lines.
        let status = u8::from(!self.drive_a) | (u8::from(!self.drive_b) << 1);
        dio.with_drive_bits(status)
    }

    fn ensure_initialized(&self) -> Result<(), DriverError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DriverError::Communication(format!(
                "simulated antenna {} not initialized",
                self.antenna
            )))
        }
    }
}

impl AntennaDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        super::DRIVER_NAME
    }

    fn init(&mut self) -> Result<(), DriverError> {
        debug!("Initializing simulated antenna {}", self.antenna);
        self.initialized = true;
        self.last_read = Some(Instant::now());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<RawFrame, DriverError> {
        self.ensure_initialized()?;

        let now = Instant::now();
        if let Some(last) = self.last_read {
            self.model
                .advance(now.duration_since(last), self.drive(), self.brake);
        }
        self.last_read = Some(now);

        let mut analog = STATIC_ANALOG;
        analog[0] = (self.model.elevation() - ENCODER_OFFSET) / ENCODER_SCALE;

        Ok(RawFrame {
            analog,
            device_temp_k: BOARD_TEMP_C + ABSOLUTE_ZERO,
            dio_state: self.dio_state().bits(),
        })
    }

    fn write_outputs(&mut self, writes: &[OutputWrite]) -> Result<(), DriverError> {
        self.ensure_initialized()?;

        // Integrate up to now under the old line levels.
        let now = Instant::now();
        if let Some(last) = self.last_read {
            self.model
                .advance(now.duration_since(last), self.drive(), self.brake);
        }
        self.last_read = Some(now);

        for &(line, level) in writes {
            match line {
                DigitalOutput::Brake => self.brake = level,
                DigitalOutput::NoiseDiodeA => self.nd_a = level,
                DigitalOutput::NoiseDiodeB => self.nd_b = level,
                DigitalOutput::DriveA => self.drive_a = level,
                DigitalOutput::DriveB => self.drive_b = level,
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        info!("Shutting down simulated antenna {}", self.antenna);
        self.drive_a = true;
        self.drive_b = true;
        self.brake = true;
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmc_common::hal::types::DriveState;
    use std::thread;
    use std::time::Duration;

    fn sim() -> SimulationDriver {
        let mut driver = SimulationDriver::new(AntennaId::new(1).unwrap());
        driver.init().unwrap();
        driver
    }

    #[test]
    fn read_before_init_fails() {
        let mut driver = SimulationDriver::new(AntennaId::new(1).unwrap());
        assert!(matches!(
            driver.read_frame(),
            Err(DriverError::Communication(_))
        ));
    }

    #[test]
    fn encoder_voltage_matches_elevation() {
        let mut driver = sim();
        let frame = driver.read_frame().unwrap();
        let elevation = ENCODER_SCALE * frame.analog[0] + ENCODER_OFFSET;
        assert!((elevation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn idle_state_word() {
        let mut driver = sim();
        let dio = driver.read_frame().unwrap().dio();
        assert_eq!(DriveState::from_bits(dio.drive_bits()), DriveState::Off);
        assert!(dio.contains(DioStatus::BRAKE));
        assert!(dio.contains(DioStatus::ND_A | DioStatus::ND_B));
        assert!(dio.contains(DioStatus::PLUS_LIMIT | DioStatus::MINUS_LIMIT));
    }

    #[test]
    fn drive_lines_reflected_as_status() {
        let mut driver = sim();
        driver.write_outputs(&DriveCommand::Up.writes()).unwrap();
        let dio = driver.read_frame().unwrap().dio();
        assert_eq!(DriveState::from_bits(dio.drive_bits()), DriveState::Up);

        driver.write_outputs(&DriveCommand::Down.writes()).unwrap();
        let dio = driver.read_frame().unwrap().dio();
        assert_eq!(DriveState::from_bits(dio.drive_bits()), DriveState::Down);
    }

    #[test]
    fn moves_only_with_brake_released() {
        let mut driver = sim();
        driver.write_outputs(&DriveCommand::Up.writes()).unwrap();
        thread::sleep(Duration::from_millis(50));
        driver.read_frame().unwrap();
        assert_eq!(driver.elevation(), 90.0);

        driver
            .write_outputs(&[(DigitalOutput::Brake, false)])
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        driver.read_frame().unwrap();
        assert!(driver.elevation() > 90.0);
    }
}
