//! Sub-record types for WitMotion datasets
//!
//! Each sub-record is a packed little-endian struct read at a fixed offset
//! within a dataset. All but the clock record start with the sync byte and
//! a type byte; the clock record's header is the frame marker itself and is
//! stripped before decoding.

/// Implements `Checksummed` and `SubRecord` for a packet with `sync` and
/// `kind` header fields.
macro_rules! headed_sub_record {
    ($packet:ty, $record:expr) => {
        impl $crate::checksum::Checksummed for $packet {
            const KIND: u8 = $record.byte();
        }

        impl $crate::records::SubRecord for $packet {
            const RECORD: $crate::records::SubRecordKind = $record;

            fn header(&self) -> Option<[u8; 2]> {
                Some([self.sync, self.kind])
            }
        }
    };
}
pub(crate) use headed_sub_record;

mod accuracy;
mod acceleration;
mod angular_velocity;
mod atmosphere;
mod attitude;
mod clock;
mod gps_position;
mod gps_speed;
mod quaternion;

pub use acceleration::{Acceleration, AccelerationPacket, ACCEL_SCALE};
pub use accuracy::{SatelliteAccuracy, SatelliteAccuracyPacket};
pub use angular_velocity::{AngularVelocity, AngularVelocityPacket, ANGULAR_RATE_SCALE};
pub use atmosphere::{Atmosphere, AtmospherePacket};
pub use attitude::{AnglePacket, Attitude};
pub use clock::ClockPacket;
pub use gps_position::{nmea_to_decimal_degrees, GpsPosition, GpsPositionPacket};
pub use gps_speed::{GpsSpeed, GpsSpeedPacket};
pub use quaternion::{Quaternion, QuaternionPacket};

use serde::Serialize;

use crate::checksum::Checksummed;

/// First byte of every sub-record on the wire.
pub const SYNC_BYTE: u8 = 0x55;

/// Sub-record types present in a dataset, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter)]
pub enum SubRecordKind {
    Clock,
    Acceleration,
    AngularVelocity,
    Angle,
    Atmosphere,
    GpsPosition,
    GpsSpeed,
    Quaternion,
    SatelliteAccuracy,
}

impl SubRecordKind {
    /// Type byte following the sync byte.
    pub const fn byte(self) -> u8 {
        match self {
            SubRecordKind::Clock => 0x50,
            SubRecordKind::Acceleration => 0x51,
            SubRecordKind::AngularVelocity => 0x52,
            SubRecordKind::Angle => 0x53,
            SubRecordKind::Atmosphere => 0x56,
            SubRecordKind::GpsPosition => 0x57,
            SubRecordKind::GpsSpeed => 0x58,
            SubRecordKind::Quaternion => 0x59,
            SubRecordKind::SatelliteAccuracy => 0x5A,
        }
    }

    /// Byte offset of this sub-record from the start of a dataset.
    pub const fn offset(self) -> usize {
        match self {
            SubRecordKind::Clock => 0,
            SubRecordKind::Acceleration => 9,
            SubRecordKind::AngularVelocity => 20,
            SubRecordKind::Angle => 31,
            SubRecordKind::Atmosphere => 42,
            SubRecordKind::GpsPosition => 53,
            SubRecordKind::GpsSpeed => 64,
            SubRecordKind::Quaternion => 75,
            SubRecordKind::SatelliteAccuracy => 86,
        }
    }

    /// Length in bytes, including header (if any) and checksum.
    pub const fn size(self) -> usize {
        match self {
            SubRecordKind::Clock => ClockPacket::PACKET_SIZE,
            _ => SUB_RECORD_SIZE,
        }
    }

    /// Offset one past the last byte of this sub-record.
    pub const fn end(self) -> usize {
        self.offset() + self.size()
    }
}

/// Size of a sub-record that carries its own `55 xx` header.
pub const SUB_RECORD_SIZE: usize = 11;

/// A sub-record packet laid out exactly as on the wire.
pub trait SubRecord: Checksummed {
    const RECORD: SubRecordKind;

    /// The `[sync, type]` header, or `None` for the headerless clock record.
    fn header(&self) -> Option<[u8; 2]>;

    /// Whether the header matches the type expected at this offset.
    fn header_matches(&self) -> bool {
        self.header()
            .map_or(true, |h| h == [SYNC_BYTE, Self::RECORD.byte()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_packet_sizes() {
        assert_eq!(std::mem::size_of::<ClockPacket>(), 9);
        assert_eq!(std::mem::size_of::<AccelerationPacket>(), 11);
        assert_eq!(std::mem::size_of::<AngularVelocityPacket>(), 11);
        assert_eq!(std::mem::size_of::<AnglePacket>(), 11);
        assert_eq!(std::mem::size_of::<AtmospherePacket>(), 11);
        assert_eq!(std::mem::size_of::<GpsPositionPacket>(), 11);
        assert_eq!(std::mem::size_of::<GpsSpeedPacket>(), 11);
        assert_eq!(std::mem::size_of::<QuaternionPacket>(), 11);
        assert_eq!(std::mem::size_of::<SatelliteAccuracyPacket>(), 11);
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let mut expected = 0;
        for kind in SubRecordKind::iter() {
            assert_eq!(kind.offset(), expected, "{kind}");
            expected = kind.end();
        }
        assert_eq!(expected, 97);
    }

    #[test]
    fn test_header_mismatch_detected() {
        let mut packet = AnglePacket::new(0, 0, 0, 0);
        assert!(packet.header_matches());
        packet.kind = SubRecordKind::Quaternion.byte();
        assert!(!packet.header_matches());
    }

    #[test]
    fn test_clock_has_no_header() {
        let packet = ClockPacket::new(0, 0, 0, 0, 0, 0, 0);
        assert!(packet.header().is_none());
        assert!(packet.header_matches());
    }
}
