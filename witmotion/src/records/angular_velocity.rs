//! Angular velocity sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;
use crate::temperature::raw_to_kelvin;

/// Full scale is ±2000 °/s.
pub const ANGULAR_RATE_SCALE: f64 = 2000.0 / 32768.0;

/// Angular velocity in °/s with die temperature in kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngularVelocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub temperature: f64,
}

/// Angular velocity packet (`55 52`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct AngularVelocityPacket {
    pub sync: u8,
    pub kind: u8,
    pub wx: i16,
    pub wy: i16,
    pub wz: i16,
    /// Hundredths of a degree Celsius
    pub temperature: i16,
    pub checksum: u8,
}

impl AngularVelocityPacket {
    /// Build a packet with a valid checksum.
    pub fn new(wx: i16, wy: i16, wz: i16, temperature: i16) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::AngularVelocity.byte(),
            wx: wx.to_le(),
            wy: wy.to_le(),
            wz: wz.to_le(),
            temperature: temperature.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn angular_velocity(&self) -> AngularVelocity {
        AngularVelocity {
            x: i16::from_le(self.wx) as f64 * ANGULAR_RATE_SCALE,
            y: i16::from_le(self.wy) as f64 * ANGULAR_RATE_SCALE,
            z: i16::from_le(self.wz) as f64 * ANGULAR_RATE_SCALE,
            temperature: raw_to_kelvin(i16::from_le(self.temperature)),
        }
    }
}

headed_sub_record!(AngularVelocityPacket, SubRecordKind::AngularVelocity);
