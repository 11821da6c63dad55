//! GPS position sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;

/// Position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Convert an NMEA-style `dddmm.mmmmm` integer (scaled by 1e5) into decimal
/// degrees.
///
/// Whole degrees are `raw / 10^7`, minutes are `(raw % 10^7) / 10^5`. The
/// sign of the raw value carries through both parts.
pub fn nmea_to_decimal_degrees(raw: i32) -> f64 {
    let degrees = (raw / 10_000_000) as f64;
    let minutes = (raw % 10_000_000) as f64 / 100_000.0;
    degrees + minutes / 60.0
}

/// GPS position packet (`55 57`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct GpsPositionPacket {
    pub sync: u8,
    pub kind: u8,
    pub latitude: i32,
    pub longitude: i32,
    pub checksum: u8,
}

impl GpsPositionPacket {
    /// Build a packet with a valid checksum.
    pub fn new(latitude: i32, longitude: i32) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::GpsPosition.byte(),
            latitude: latitude.to_le(),
            longitude: longitude.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn position(&self) -> GpsPosition {
        GpsPosition {
            latitude: nmea_to_decimal_degrees(i32::from_le(self.latitude)),
            longitude: nmea_to_decimal_degrees(i32::from_le(self.longitude)),
        }
    }
}

headed_sub_record!(GpsPositionPacket, SubRecordKind::GpsPosition);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nmea_conversion() {
        // 22° 32.12345' -> 22.5353908...
        assert_relative_eq!(
            nmea_to_decimal_degrees(223_212_345),
            22.0 + 32.12345 / 60.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_three_digit_longitude() {
        // 113° 56.78900'
        assert_relative_eq!(
            nmea_to_decimal_degrees(1_135_678_900),
            113.0 + 56.789 / 60.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_southern_hemisphere() {
        let position = GpsPositionPacket::new(-334_500_000, 1_511_200_000).position();
        assert_relative_eq!(position.latitude, -(33.0 + 45.0 / 60.0), epsilon = 1e-9);
        assert_relative_eq!(position.longitude, 151.0 + 12.0 / 60.0, epsilon = 1e-9);
    }
}
