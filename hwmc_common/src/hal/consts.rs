//! HAL (Hardware Abstraction Layer) constants.
//!
//! Channel layout of one antenna controller: the batch read returns
//! [`NUM_ANALOG`] analog inputs, the device temperature and the packed
//! digital state word.

/// Canonical HAL service name (used for logging).
pub const HAL_SERVICE_NAME: &str = "hal";

/// Number of analog inputs read per frame (`AIN0..AIN13`).
pub const NUM_ANALOG: usize = 14;

/// Analog input voltage range configured at init (volts).
pub const AIN_RANGE_V: f64 = 10.0;

/// Bit offset of the two drive status bits in `DIO_STATE`.
pub const DRIVE_STATUS_SHIFT: u32 = 8;

/// Bit of the brake status in `DIO_STATE`.
pub const BRAKE_BIT: u32 = 16;

/// Bit of the plus limit switch in `DIO_STATE`.
pub const PLUS_LIMIT_BIT: u32 = 17;

/// Bit of the minus limit switch in `DIO_STATE`.
pub const MINUS_LIMIT_BIT: u32 = 18;

/// Bit of the polarization A noise diode in `DIO_STATE` (active low).
pub const ND_A_BIT: u32 = 20;

/// Bit of the polarization B noise diode in `DIO_STATE` (active low).
pub const ND_B_BIT: u32 = 21;

/// Bit of the fan error flag in `DIO_STATE`.
pub const FAN_ERR_BIT: u32 = 22;

/// Elevation encoder scale (deg/V); the encoder spans ±90° over 0.5–4.5 V.
pub const ENCODER_SCALE: f64 = 45.0;

/// Elevation encoder offset (deg).
pub const ENCODER_OFFSET: f64 = -22.5;
