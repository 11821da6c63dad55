//! Pressure and barometric altitude sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;

/// Barometric pressure and altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Atmosphere {
    /// Pressure in the configured unit (pascal or hectopascal)
    pub pressure: f64,
    /// Barometric altitude in meters
    pub altitude: f64,
}

/// Atmospheric packet (`55 56`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct AtmospherePacket {
    pub sync: u8,
    pub kind: u8,
    /// Pascals
    pub pressure: i32,
    /// Centimeters
    pub height: i32,
    pub checksum: u8,
}

impl AtmospherePacket {
    /// Build a packet with a valid checksum.
    pub fn new(pressure: i32, height: i32) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::Atmosphere.byte(),
            pressure: pressure.to_le(),
            height: height.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn pressure_pa(&self) -> f64 {
        i32::from_le(self.pressure) as f64
    }

    pub fn altitude_m(&self) -> f64 {
        i32::from_le(self.height) as f64 / 100.0
    }
}

headed_sub_record!(AtmospherePacket, SubRecordKind::Atmosphere);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sea_level() {
        let packet = AtmospherePacket::new(101_325, 1234);
        assert_relative_eq!(packet.pressure_pa(), 101_325.0);
        assert_relative_eq!(packet.altitude_m(), 12.34, epsilon = 1e-9);
    }

    #[test]
    fn test_below_reference_altitude() {
        let packet = AtmospherePacket::new(102_000, -550);
        assert_relative_eq!(packet.altitude_m(), -5.5, epsilon = 1e-9);
    }
}
