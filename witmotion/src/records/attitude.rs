//! Angle sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::angle::{heading_rad, to_rad};
use crate::checksum::Checksummed;

/// Attitude in radians, each in `(-π, π]`, plus magnetic heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    /// Magnetic heading in radians, offset applied
    pub heading: f64,
    /// Firmware version word carried in the record
    pub version: u16,
}

/// Angle packet (`55 53`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct AnglePacket {
    pub sync: u8,
    pub kind: u8,
    pub pitch: u16,
    pub roll: u16,
    pub yaw: u16,
    pub version: u16,
    pub checksum: u8,
}

impl AnglePacket {
    /// Build a packet with a valid checksum.
    pub fn new(pitch: u16, roll: u16, yaw: u16, version: u16) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::Angle.byte(),
            pitch: pitch.to_le(),
            roll: roll.to_le(),
            yaw: yaw.to_le(),
            version: version.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    /// Decode with the given heading offset in degrees.
    pub fn attitude(&self, heading_offset_deg: f64) -> Attitude {
        let yaw_raw = u16::from_le(self.yaw);
        Attitude {
            roll: to_rad(u16::from_le(self.roll)),
            pitch: to_rad(u16::from_le(self.pitch)),
            yaw: to_rad(yaw_raw),
            heading: heading_rad(yaw_raw, heading_offset_deg),
            version: u16::from_le(self.version),
        }
    }
}

headed_sub_record!(AnglePacket, SubRecordKind::Angle);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_level_facing_quarter_turn() {
        let attitude = AnglePacket::new(0, 0, 16384, 0).attitude(0.0);
        assert_relative_eq!(attitude.roll, 0.0);
        assert_relative_eq!(attitude.pitch, 0.0);
        assert_relative_eq!(attitude.yaw, PI / 2.0, epsilon = 1e-6);
        assert_relative_eq!(attitude.heading, 1.5 * PI, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_and_roll_are_not_swapped() {
        // pitch 90 degrees, roll -90 degrees
        let attitude = AnglePacket::new(16384, 49152, 0, 0).attitude(0.0);
        assert_relative_eq!(attitude.pitch, PI / 2.0, epsilon = 1e-6);
        assert_relative_eq!(attitude.roll, -PI / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_heading_offset_applied() {
        let attitude = AnglePacket::new(0, 0, 16384, 0).attitude(15.0);
        assert_relative_eq!(attitude.heading, 285.0_f64.to_radians(), epsilon = 1e-9);
    }
}
