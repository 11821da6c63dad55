//! GPS ground speed sub-record

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{headed_sub_record, SubRecordKind, SYNC_BYTE};
use crate::checksum::Checksummed;

const KMH_TO_MPS: f64 = 1000.0 / 3600.0;

/// GPS altitude, course and ground speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsSpeed {
    /// GPS altitude in meters
    pub altitude: f64,
    /// Course over ground in degrees
    pub course: f64,
    /// Ground speed in km/h
    pub speed_kmh: f64,
}

impl GpsSpeed {
    pub fn speed_mps(&self) -> f64 {
        self.speed_kmh * KMH_TO_MPS
    }

    pub fn course_rad(&self) -> f64 {
        self.course.to_radians()
    }
}

/// GPS ground speed packet (`55 58`)
///
/// Total packet size: 11 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct GpsSpeedPacket {
    pub sync: u8,
    pub kind: u8,
    /// Decimeters
    pub height: i16,
    /// Hundredths of a degree
    pub yaw: u16,
    /// Thousandths of a km/h
    pub speed: u32,
    pub checksum: u8,
}

impl GpsSpeedPacket {
    /// Build a packet with a valid checksum.
    pub fn new(height: i16, yaw: u16, speed: u32) -> Self {
        let mut packet = Self {
            sync: SYNC_BYTE,
            kind: SubRecordKind::GpsSpeed.byte(),
            height: height.to_le(),
            yaw: yaw.to_le(),
            speed: speed.to_le(),
            checksum: 0,
        };
        packet.update_checksum();
        packet
    }

    pub fn gps_speed(&self) -> GpsSpeed {
        GpsSpeed {
            altitude: i16::from_le(self.height) as f64 / 10.0,
            course: u16::from_le(self.yaw) as f64 / 100.0,
            speed_kmh: u32::from_le(self.speed) as f64 / 1000.0,
        }
    }
}

headed_sub_record!(GpsSpeedPacket, SubRecordKind::GpsSpeed);
