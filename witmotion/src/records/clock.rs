//! Time sub-record

use bytemuck::{Pod, Zeroable};

use super::{SubRecord, SubRecordKind};
use crate::checksum::Checksummed;
use crate::time::SensorTime;

/// Time sub-record with its `55 50` marker stripped by the frame splitter.
///
/// Total packet size: 9 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct ClockPacket {
    /// Years since 2000
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub checksum: u8,
}

impl ClockPacket {
    /// Expected packet size in bytes
    pub const PACKET_SIZE: usize = 9;

    /// Build a packet with a valid checksum.
    pub fn new(
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
    ) -> Self {
        let mut packet = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond: millisecond.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn sensor_time(&self) -> SensorTime {
        SensorTime {
            year: 2000 + self.year as u16,
            month: self.month,
            day: self.day,
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            millisecond: u16::from_le(self.millisecond),
        }
    }
}

impl Checksummed for ClockPacket {
    const KIND: u8 = SubRecordKind::Clock.byte();
}

impl SubRecord for ClockPacket {
    const RECORD: SubRecordKind = SubRecordKind::Clock;

    fn header(&self) -> Option<[u8; 2]> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_time_offsets_year() {
        let packet = ClockPacket::new(24, 12, 31, 23, 59, 58, 999);
        let time = packet.sensor_time();
        assert_eq!(time.year, 2024);
        assert_eq!(time.month, 12);
        assert_eq!(time.millisecond, 999);
    }

    #[test]
    fn test_wire_layout() {
        let packet = ClockPacket::new(24, 1, 2, 3, 4, 5, 0x0102);
        let bytes = bytemuck::bytes_of(&packet);
        assert_eq!(&bytes[..8], &[24, 1, 2, 3, 4, 5, 0x02, 0x01]);
    }
}
