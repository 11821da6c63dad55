//! Satellite count and dilution of precision sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SatelliteAccuracy {
    pub satellites: i16,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
}

/// Satellite accuracy packet (`55 5A`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct SatelliteAccuracyPacket {
    pub sync: u8,
    pub kind: u8,
    pub satellites: i16,
    pub pdop: u16,
    pub hdop: u16,
    pub vdop: u16,
    pub checksum: u8,
}

impl SatelliteAccuracyPacket {
    /// Build a packet with a valid checksum.
    pub fn new(satellites: i16, pdop: u16, hdop: u16, vdop: u16) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::SatelliteAccuracy.byte(),
            satellites: satellites.to_le(),
            pdop: pdop.to_le(),
            hdop: hdop.to_le(),
            vdop: vdop.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn accuracy(&self) -> SatelliteAccuracy {
        SatelliteAccuracy {
            satellites: i16::from_le(self.satellites),
            pdop: u16::from_le(self.pdop) as f64 / 32768.0,
            hdop: u16::from_le(self.hdop) as f64 / 32768.0,
            vdop: u16::from_le(self.vdop) as f64 / 32768.0,
        }
    }
}

headed_sub_record!(SatelliteAccuracyPacket, SubRecordKind::SatelliteAccuracy);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy_scaling() {
        let accuracy = SatelliteAccuracyPacket::new(9, 8192, 16384, 32768).accuracy();
        assert_eq!(accuracy.satellites, 9);
        assert_relative_eq!(accuracy.pdop, 0.25);
        assert_relative_eq!(accuracy.hdop, 0.5);
        assert_relative_eq!(accuracy.vdop, 1.0);
    }
}
