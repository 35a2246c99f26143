//! Per-antenna monitor-point snapshot and channel conversions.

use std::sync::Arc;

use hwmc_common::consts::{ABSOLUTE_ZERO, TEMPERATURE_SENTINEL};
use hwmc_common::hal::consts::{ENCODER_OFFSET, ENCODER_SCALE};
use hwmc_common::hal::types::{DioStatus, DriveState, RawFrame};
use hwmc_common::monitor::{Mjd, MonitorPointSet, MonitorValue};

/// Monitor-point names as published on the bus.
pub mod points {
    pub const ANT_EL: &str = "ant_el";
    pub const FOC_TEMP: &str = "foc_temp";
    pub const LNA_A_CURRENT: &str = "lna_a_current";
    pub const RF_A_POWER: &str = "rf_a_power";
    pub const LASER_A_VOLTAGE: &str = "laser_a_voltage";
    pub const FEB_A_CURRENT: &str = "feb_a_current";
    pub const FEB_A_TEMP: &str = "feb_a_temp";
    pub const LNA_B_CURRENT: &str = "lna_b_current";
    pub const RF_B_POWER: &str = "rf_b_power";
    pub const LASER_B_VOLTAGE: &str = "laser_b_voltage";
    pub const FEB_B_CURRENT: &str = "feb_b_current";
    pub const FEB_B_TEMP: &str = "feb_b_temp";
    pub const PSU_VOLTAGE: &str = "psu_voltage";
    pub const LJ_TEMP: &str = "lj_temp";
    pub const DRIVE_STATE: &str = "drive_state";
    pub const ND1: &str = "nd1";
    pub const ND2: &str = "nd2";
    pub const BRAKE: &str = "brake";
    pub const PLUS_LIMIT: &str = "plus_limit";
    pub const MINUS_LIMIT: &str = "minus_limit";
    pub const FAN_ERR: &str = "fan_err";
}

/// Temperature sensors: 50 °C/V, offset -25 °C.
fn temperature(volts: f64) -> f64 {
    50.0 * volts - 25.0
}

/// RF detectors: dBm.
fn rf_power(volts: f64) -> f64 {
    28.571 * volts - 90.0
}

/// Elevation encoder: degrees.
pub fn encoder_elevation(volts: f64) -> f64 {
    ENCODER_SCALE * volts + ENCODER_OFFSET
}

/// Latest known state of one antenna.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub ant_el: f64,
    pub foc_temp: f64,
    pub lna_a_current: f64,
    pub rf_a_power: f64,
    pub laser_a_voltage: f64,
    pub feb_a_current: f64,
    pub feb_a_temp: f64,
    pub lna_b_current: f64,
    pub rf_b_power: f64,
    pub laser_b_voltage: f64,
    pub feb_b_current: f64,
    pub feb_b_temp: f64,
    pub psu_voltage: f64,
    pub lj_temp: f64,
    pub drive_state: DriveState,
    /// Polarization A noise diode on.
    pub nd1: bool,
    /// Polarization B noise diode on.
    pub nd2: bool,
    pub brake: bool,
    pub plus_limit: bool,
    pub minus_limit: bool,
    pub fan_err: bool,
}

impl Default for MonitorSnapshot {
    /// Zeroes everywhere except the temperatures, which start at absolute zero.
    fn default() -> Self {
        Self {
            ant_el: 0.0,
            foc_temp: TEMPERATURE_SENTINEL,
            lna_a_current: 0.0,
            rf_a_power: 0.0,
            laser_a_voltage: 0.0,
            feb_a_current: 0.0,
            feb_a_temp: 0.0,
            lna_b_current: 0.0,
            rf_b_power: 0.0,
            laser_b_voltage: 0.0,
            feb_b_current: 0.0,
            feb_b_temp: 0.0,
            psu_voltage: 0.0,
            lj_temp: TEMPERATURE_SENTINEL,
            drive_state: DriveState::Off,
            nd1: false,
            nd2: false,
            brake: false,
            plus_limit: false,
            minus_limit: false,
            fan_err: false,
        }
    }
}

impl MonitorSnapshot {
    /// Apply one raw frame.
    pub fn update(&mut self, frame: &RawFrame) {
        let ain = &frame.analog;
        self.ant_el = encoder_elevation(ain[0]);
        self.foc_temp = temperature(ain[1]);
        self.lna_a_current = 100.0 * ain[2];
        self.rf_a_power = rf_power(ain[3]);
        self.laser_a_voltage = ain[4];
        self.feb_a_current = 1000.0 * ain[5];
        self.feb_a_temp = temperature(ain[6]);
        self.lna_b_current = 1000.0 * ain[7];
        self.rf_b_power = rf_power(ain[8]);
        self.laser_b_voltage = ain[9];
        self.feb_b_current = 100.0 * ain[10];
        self.feb_b_temp = temperature(ain[11]);
        self.psu_voltage = ain[12];
        self.lj_temp = frame.device_temp_k - ABSOLUTE_ZERO;

        let dio = frame.dio();
        self.drive_state = DriveState::from_bits(dio.drive_bits());
        self.nd1 = !dio.contains(DioStatus::ND_A);
        self.nd2 = !dio.contains(DioStatus::ND_B);
        self.brake = dio.contains(DioStatus::BRAKE);
        self.plus_limit = dio.contains(DioStatus::PLUS_LIMIT);
        self.minus_limit = dio.contains(DioStatus::MINUS_LIMIT);
        self.fan_err = dio.contains(DioStatus::FAN_ERR);
    }

    /// Copy out as a record set for the bus.
    pub fn to_point_set(&self, timestamp: Mjd, source: &Arc<str>) -> MonitorPointSet {
        use points::*;
        let points: Vec<(&'static str, MonitorValue)> = vec![
            (ANT_EL, self.ant_el.into()),
            (FOC_TEMP, self.foc_temp.into()),
            (LNA_A_CURRENT, self.lna_a_current.into()),
            (RF_A_POWER, self.rf_a_power.into()),
            (LASER_A_VOLTAGE, self.laser_a_voltage.into()),
            (FEB_A_CURRENT, self.feb_a_current.into()),
            (FEB_A_TEMP, self.feb_a_temp.into()),
            (LNA_B_CURRENT, self.lna_b_current.into()),
            (RF_B_POWER, self.rf_b_power.into()),
            (LASER_B_VOLTAGE, self.laser_b_voltage.into()),
            (FEB_B_CURRENT, self.feb_b_current.into()),
            (FEB_B_TEMP, self.feb_b_temp.into()),
            (PSU_VOLTAGE, self.psu_voltage.into()),
            (LJ_TEMP, self.lj_temp.into()),
            (DRIVE_STATE, i64::from(self.drive_state.code()).into()),
            (ND1, self.nd1.into()),
            (ND2, self.nd2.into()),
            (BRAKE, self.brake.into()),
            (PLUS_LIMIT, self.plus_limit.into()),
            (MINUS_LIMIT, self.minus_limit.into()),
            (FAN_ERR, self.fan_err.into()),
        ];
        MonitorPointSet {
            timestamp,
            source: Arc::clone(source),
            points,
        }
    }
}
