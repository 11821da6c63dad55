//! Acceleration sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;
use crate::temperature::raw_to_kelvin;

/// Full scale is ±16 g with g taken as 9.8 m/s².
pub const ACCEL_SCALE: f64 = 16.0 * 9.8 / 32768.0;

/// Linear acceleration in m/s² with die temperature in kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub temperature: f64,
}

/// Acceleration packet (`55 51`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct AccelerationPacket {
    pub sync: u8,
    pub kind: u8,
    pub ax: i16,
    pub ay: i16,
    pub az: i16,
    /// Hundredths of a degree Celsius
    pub temperature: i16,
    pub checksum: u8,
}

impl AccelerationPacket {
    /// Build a packet with a valid checksum.
    pub fn new(ax: i16, ay: i16, az: i16, temperature: i16) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::Acceleration.byte(),
            ax: ax.to_le(),
            ay: ay.to_le(),
            az: az.to_le(),
            temperature: temperature.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn acceleration(&self) -> Acceleration {
        Acceleration {
            x: i16::from_le(self.ax) as f64 * ACCEL_SCALE,
            y: i16::from_le(self.ay) as f64 * ACCEL_SCALE,
            z: i16::from_le(self.az) as f64 * ACCEL_SCALE,
            temperature: raw_to_kelvin(i16::from_le(self.temperature)),
        }
    }
}

headed_sub_record!(AccelerationPacket, SubRecordKind::Acceleration);
