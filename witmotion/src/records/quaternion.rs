//! Quaternion sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;

/// Orientation quaternion, unitless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quaternion {
    pub q0: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Quaternion packet (`55 59`)
///
/// `q2` and `q3` are read unsigned, matching the deployed decoder. A
/// negative component therefore decodes to a value in `[1, 2)`.
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct QuaternionPacket {
    pub sync: u8,
    pub kind: u8,
    pub q0: i16,
    pub q1: i16,
    pub q2: u16,
    pub q3: u16,
    pub checksum: u8,
}

impl QuaternionPacket {
    /// Build a packet with a valid checksum.
    pub fn new(q0: i16, q1: i16, q2: u16, q3: u16) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::Quaternion.byte(),
            q0: q0.to_le(),
            q1: q1.to_le(),
            q2: q2.to_le(),
            q3: q3.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn quaternion(&self) -> Quaternion {
        Quaternion {
            q0: i16::from_le(self.q0) as f64 / 32768.0,
            q1: i16::from_le(self.q1) as f64 / 32768.0,
            q2: u16::from_le(self.q2) as f64 / 32768.0,
            q3: u16::from_le(self.q3) as f64 / 32768.0,
        }
    }
}

headed_sub_record!(QuaternionPacket, SubRecordKind::Quaternion);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let q = QuaternionPacket::new(i16::MAX, 0, 0, 0).quaternion();
        assert_relative_eq!(q.q0, 1.0, epsilon = 1e-4);
        assert_relative_eq!(q.q1, 0.0);
    }

    #[test]
    fn test_signed_and_unsigned_halves() {
        let q = QuaternionPacket::new(-16384, -16384, 16384, 49152).quaternion();
        assert_relative_eq!(q.q0, -0.5);
        assert_relative_eq!(q.q1, -0.5);
        assert_relative_eq!(q.q2, 0.5);
        assert_relative_eq!(q.q3, 1.5);
    }
}
