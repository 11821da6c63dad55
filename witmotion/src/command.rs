//! Configuration commands accepted by the sensor
//!
//! Every command is five bytes: `FF AA <register> <low> <high>`. Writes only
//! persist across power cycles when preceded by [`Command::Unlock`] and
//! followed by [`Command::Save`].

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Command frame header
pub const COMMAND_HEADER: [u8; 2] = [0xFF, 0xAA];

const REG_SAVE: u8 = 0x00;
const REG_CALSW: u8 = 0x01;
const REG_RSW: u8 = 0x02;
const REG_RRATE: u8 = 0x03;
const REG_KEY: u8 = 0x69;

const UNLOCK_KEY: u16 = 0xB588;

const CALSW_NORMAL: u8 = 0x00;
const CALSW_ACCEL: u8 = 0x01;
const CALSW_ANGLE_REFERENCE: u8 = 0x08;

/// Output rates selectable on the sensor, in register order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum OutputRate {
    #[strum(serialize = "0.2Hz")]
    #[serde(rename = "0.2Hz")]
    Hz0_2,
    #[strum(serialize = "0.5Hz")]
    #[serde(rename = "0.5Hz")]
    Hz0_5,
    #[strum(serialize = "1Hz")]
    #[serde(rename = "1Hz")]
    Hz1,
    #[strum(serialize = "2Hz")]
    #[serde(rename = "2Hz")]
    Hz2,
    #[strum(serialize = "5Hz")]
    #[serde(rename = "5Hz")]
    Hz5,
    #[default]
    #[strum(serialize = "10Hz")]
    #[serde(rename = "10Hz")]
    Hz10,
    #[strum(serialize = "20Hz")]
    #[serde(rename = "20Hz")]
    Hz20,
    #[strum(serialize = "50Hz")]
    #[serde(rename = "50Hz")]
    Hz50,
}

impl OutputRate {
    /// Position of this rate in the enumeration (0-based).
    pub fn index(self) -> usize {
        OutputRate::iter().position(|r| r == self).unwrap_or_default()
    }

    /// Value written to the rate register (1-based).
    pub fn register_value(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn hz(self) -> f64 {
        match self {
            OutputRate::Hz0_2 => 0.2,
            OutputRate::Hz0_5 => 0.5,
            OutputRate::Hz1 => 1.0,
            OutputRate::Hz2 => 2.0,
            OutputRate::Hz5 => 5.0,
            OutputRate::Hz10 => 10.0,
            OutputRate::Hz20 => 20.0,
            OutputRate::Hz50 => 50.0,
        }
    }
}

bitflags! {
    /// Sub-records the sensor emits each output period.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputContent: u16 {
        const TIME = 1 << 0;
        const ACCELERATION = 1 << 1;
        const ANGULAR_VELOCITY = 1 << 2;
        const ANGLE = 1 << 3;
        const MAGNETIC = 1 << 4;
        const PORT_STATUS = 1 << 5;
        const ATMOSPHERE = 1 << 6;
        const GPS_POSITION = 1 << 7;
        const GPS_SPEED = 1 << 8;
        const QUATERNION = 1 << 9;
        const SATELLITE_ACCURACY = 1 << 10;
    }
}

/// Record set matching the fixed dataset offsets decoded by this crate.
pub const DEFAULT_OUTPUT_CONTENT: OutputContent = OutputContent::TIME
    .union(OutputContent::ACCELERATION)
    .union(OutputContent::ANGULAR_VELOCITY)
    .union(OutputContent::ANGLE)
    .union(OutputContent::ATMOSPHERE)
    .union(OutputContent::GPS_POSITION)
    .union(OutputContent::GPS_SPEED)
    .union(OutputContent::QUATERNION)
    .union(OutputContent::SATELLITE_ACCURACY);

/// A single configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Unlock configuration registers for writing
    Unlock,
    /// Persist the current configuration
    Save,
    SetOutputRate(OutputRate),
    SelectOutput(OutputContent),
    StartAccelCalibration,
    StopAccelCalibration,
    ResetAngleReference,
}

impl Command {
    /// Encode to the five wire bytes.
    pub fn to_bytes(self) -> [u8; 5] {
        let (register, value) = match self {
            Command::Unlock => (REG_KEY, UNLOCK_KEY),
            Command::Save => (REG_SAVE, 0),
            Command::SetOutputRate(rate) => (REG_RRATE, rate.register_value() as u16),
            Command::SelectOutput(content) => (REG_RSW, content.bits()),
            Command::StartAccelCalibration => (REG_CALSW, CALSW_ACCEL as u16),
            Command::StopAccelCalibration => (REG_CALSW, CALSW_NORMAL as u16),
            Command::ResetAngleReference => (REG_CALSW, CALSW_ANGLE_REFERENCE as u16),
        };
        let [low, high] = value.to_le_bytes();
        [COMMAND_HEADER[0], COMMAND_HEADER[1], register, low, high]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Unlock => write!(f, "unlock"),
            Command::Save => write!(f, "save configuration"),
            Command::SetOutputRate(rate) => write!(f, "set output rate {rate}"),
            Command::SelectOutput(content) => {
                write!(f, "select output set {:#06x}", content.bits())
            }
            Command::StartAccelCalibration => write!(f, "start accelerometer calibration"),
            Command::StopAccelCalibration => write!(f, "stop accelerometer calibration"),
            Command::ResetAngleReference => write!(f, "reset angle reference"),
        }
    }
}
