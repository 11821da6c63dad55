//! Dataset decoding
//!
//! A dataset is one run of bytes between frame markers. It holds up to nine
//! sub-records at fixed offsets; whichever ones fit entirely inside the
//! buffer are decoded independently of each other.
//!
//! | Sub-record         | Offset | Size |
//! |--------------------|--------|------|
//! | Time               | 0      | 9    |
//! | Acceleration       | 9      | 11   |
//! | Angular velocity   | 20     | 11   |
//! | Angle              | 31     | 11   |
//! | Atmospheric        | 42     | 11   |
//! | GPS position       | 53     | 11   |
//! | GPS ground speed   | 64     | 11   |
//! | Quaternion         | 75     | 11   |
//! | Satellite accuracy | 86     | 11   |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checksum::Checksummed;
use crate::records::{
    Acceleration, AccelerationPacket, AnglePacket, AngularVelocity, AngularVelocityPacket,
    Atmosphere, AtmospherePacket, Attitude, ClockPacket, GpsPosition, GpsPositionPacket,
    GpsSpeed, GpsSpeedPacket, Quaternion, QuaternionPacket, SatelliteAccuracy,
    SatelliteAccuracyPacket, SubRecord, SubRecordKind,
};
use crate::time::SensorTime;

/// Smallest buffer that holds any sub-record (the time record).
pub const MIN_DATASET_LEN: usize = ClockPacket::PACKET_SIZE;

/// Unit used when reporting barometric pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    #[default]
    Pascal,
    Hectopascal,
}

impl PressureUnit {
    pub fn from_pascal(self, pascal: f64) -> f64 {
        match self {
            PressureUnit::Pascal => pascal,
            PressureUnit::Hectopascal => pascal / 100.0,
        }
    }
}

/// Decoder policy shared by every device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Drop the whole dataset when any sub-record checksum fails.
    ///
    /// Off by default until validated against hardware.
    pub enforce_checksum: bool,
    /// Skip sub-records whose `55 xx` header is not the expected type.
    pub validate_markers: bool,
    pub pressure_unit: PressureUnit,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            enforce_checksum: false,
            validate_markers: true,
            pressure_unit: PressureUnit::Pascal,
        }
    }
}

/// Errors that reject a dataset outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("dataset too short: {len} bytes, need at least {MIN_DATASET_LEN}")]
    TooShort { len: usize },

    #[error("{record} checksum mismatch: stored {stored:#04x}, computed {computed:#04x}")]
    ChecksumMismatch {
        record: SubRecordKind,
        stored: u8,
        computed: u8,
    },
}

/// Problem found with one sub-record of an otherwise accepted dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// Header bytes did not name the sub-record expected at this offset.
    UnknownMarker { found: [u8; 2] },
    /// Checksum failed while enforcement is off; the record was kept.
    ChecksumMismatch { stored: u8, computed: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubRecordIssue {
    pub record: SubRecordKind,
    pub offset: usize,
    pub kind: IssueKind,
}

impl fmt::Display for SubRecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::UnknownMarker { found } => write!(
                f,
                "{} at offset {}: unexpected marker {:02X} {:02X}",
                self.record, self.offset, found[0], found[1]
            ),
            IssueKind::ChecksumMismatch { stored, computed } => write!(
                f,
                "{} at offset {}: checksum {stored:#04x} != {computed:#04x}",
                self.record, self.offset
            ),
        }
    }
}

/// Decoded contents of one dataset.
///
/// Each sub-record is `None` when the buffer ended before it, or when its
/// header was rejected (see `issues`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementSet {
    pub time: Option<SensorTime>,
    pub acceleration: Option<Acceleration>,
    pub angular_velocity: Option<AngularVelocity>,
    pub attitude: Option<Attitude>,
    pub atmosphere: Option<Atmosphere>,
    pub gps_position: Option<GpsPosition>,
    pub gps_speed: Option<GpsSpeed>,
    pub quaternion: Option<Quaternion>,
    pub satellite_accuracy: Option<SatelliteAccuracy>,
    pub issues: Vec<SubRecordIssue>,
}

impl MeasurementSet {
    /// Sub-records present in this set, in wire order.
    pub fn present(&self) -> Vec<SubRecordKind> {
        let flags = [
            (SubRecordKind::Clock, self.time.is_some()),
            (SubRecordKind::Acceleration, self.acceleration.is_some()),
            (SubRecordKind::AngularVelocity, self.angular_velocity.is_some()),
            (SubRecordKind::Angle, self.attitude.is_some()),
            (SubRecordKind::Atmosphere, self.atmosphere.is_some()),
            (SubRecordKind::GpsPosition, self.gps_position.is_some()),
            (SubRecordKind::GpsSpeed, self.gps_speed.is_some()),
            (SubRecordKind::Quaternion, self.quaternion.is_some()),
            (SubRecordKind::SatelliteAccuracy, self.satellite_accuracy.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(kind, present)| present.then_some(kind))
            .collect()
    }
}

/// Dataset decoder for one device.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetDecoder {
    options: DecodeOptions,
    heading_offset_deg: f64,
}

impl DatasetDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            heading_offset_deg: 0.0,
        }
    }

    /// Set the heading offset in degrees added to the magnetic heading.
    pub fn with_heading_offset(mut self, degrees: f64) -> Self {
        self.heading_offset_deg = degrees;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn heading_offset(&self) -> f64 {
        self.heading_offset_deg
    }

    /// Decode one dataset buffer (frame marker already stripped).
    pub fn decode(&self, buf: &[u8]) -> Result<MeasurementSet, DecodeError> {
        if buf.len() < MIN_DATASET_LEN {
            return Err(DecodeError::TooShort { len: buf.len() });
        }

        let mut set = MeasurementSet::default();
        let issues = &mut set.issues;

        set.time = self
            .read::<ClockPacket>(buf, issues)?
            .map(|p| p.sensor_time());
        set.acceleration = self
            .read::<AccelerationPacket>(buf, issues)?
            .map(|p| p.acceleration());
        set.angular_velocity = self
            .read::<AngularVelocityPacket>(buf, issues)?
            .map(|p| p.angular_velocity());
        set.attitude = self
            .read::<AnglePacket>(buf, issues)?
            .map(|p| p.attitude(self.heading_offset_deg));
        set.atmosphere = self
            .read::<AtmospherePacket>(buf, issues)?
            .map(|p| Atmosphere {
                pressure: self.options.pressure_unit.from_pascal(p.pressure_pa()),
                altitude: p.altitude_m(),
            });
        set.gps_position = self
            .read::<GpsPositionPacket>(buf, issues)?
            .map(|p| p.position());
        set.gps_speed = self
            .read::<GpsSpeedPacket>(buf, issues)?
            .map(|p| p.gps_speed());
        set.quaternion = self
            .read::<QuaternionPacket>(buf, issues)?
            .map(|p| p.quaternion());
        set.satellite_accuracy = self
            .read::<SatelliteAccuracyPacket>(buf, issues)?
            .map(|p| p.accuracy());

        Ok(set)
    }

    /// Read the sub-record `T` at its fixed offset, if the buffer covers it.
    fn read<T: SubRecord>(
        &self,
        buf: &[u8],
        issues: &mut Vec<SubRecordIssue>,
    ) -> Result<Option<T>, DecodeError> {
        let record = T::RECORD;
        let Some(bytes) = buf.get(record.offset()..record.end()) else {
            return Ok(None);
        };
        let packet: T = bytemuck::pod_read_unaligned(bytes);

        if self.options.validate_markers && !packet.header_matches() {
            let found = packet.header().unwrap_or_default();
            issues.push(SubRecordIssue {
                record,
                offset: record.offset(),
                kind: IssueKind::UnknownMarker { found },
            });
            return Ok(None);
        }

        if !packet.verify_checksum() {
            let stored = packet.stored_checksum();
            let computed = packet.compute_checksum();
            if self.options.enforce_checksum {
                return Err(DecodeError::ChecksumMismatch {
                    record,
                    stored,
                    computed,
                });
            }
            issues.push(SubRecordIssue {
                record,
                offset: record.offset(),
                kind: IssueKind::ChecksumMismatch { stored, computed },
            });
        }

        Ok(Some(packet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bytemuck::bytes_of;
    use std::f64::consts::PI;

    /// A complete 97-byte dataset with every sub-record populated.
    fn full_dataset() -> Vec<u8> {
        let mut buf = Vec::with_capacity(97);
        buf.extend_from_slice(bytes_of(&ClockPacket::new(24, 3, 14, 12, 30, 45, 500)));
        buf.extend_from_slice(bytes_of(&AccelerationPacket::new(1024, -1024, 2048, 2512)));
        buf.extend_from_slice(bytes_of(&AngularVelocityPacket::new(328, 0, -16384, 2512)));
        buf.extend_from_slice(bytes_of(&AnglePacket::new(0, 0, 16384, 0x4698)));
        buf.extend_from_slice(bytes_of(&AtmospherePacket::new(101_325, 4250)));
        buf.extend_from_slice(bytes_of(&GpsPositionPacket::new(
            223_212_345,
            1_135_678_900,
        )));
        buf.extend_from_slice(bytes_of(&GpsSpeedPacket::new(505, 9000, 18_000)));
        buf.extend_from_slice(bytes_of(&QuaternionPacket::new(16384, -16384, 16384, 0)));
        buf.extend_from_slice(bytes_of(&SatelliteAccuracyPacket::new(
            11, 4096, 8192, 16384,
        )));
        buf
    }

    #[test]
    fn test_full_dataset_decodes_every_record() {
        let buf = full_dataset();
        assert_eq!(buf.len(), 97);

        let set = DatasetDecoder::default().decode(&buf).unwrap();
        assert_eq!(set.present().len(), 9);
        assert!(set.issues.is_empty());

        let time = set.time.unwrap();
        assert_eq!((time.year, time.month, time.day), (2024, 3, 14));
        assert_eq!((time.hour, time.minute, time.second), (12, 30, 45));
        assert_eq!(time.millisecond, 500);

        let accel = set.acceleration.unwrap();
        assert_relative_eq!(accel.x, 4.9, epsilon = 1e-9);
        assert_relative_eq!(accel.y, -4.9, epsilon = 1e-9);
        assert_relative_eq!(accel.z, 9.8, epsilon = 1e-9);
        assert_relative_eq!(accel.temperature, 298.27, epsilon = 1e-9);

        let rate = set.angular_velocity.unwrap();
        assert_relative_eq!(rate.x, 328.0 * 2000.0 / 32768.0, epsilon = 1e-9);
        assert_relative_eq!(rate.z, -1000.0, epsilon = 1e-9);
        assert_relative_eq!(rate.temperature, accel.temperature);

        let attitude = set.attitude.unwrap();
        assert_relative_eq!(attitude.roll, 0.0);
        assert_relative_eq!(attitude.pitch, 0.0);
        assert_relative_eq!(attitude.yaw, PI / 2.0, epsilon = 1e-6);
        assert_relative_eq!(attitude.heading, 1.5 * PI, epsilon = 1e-6);
        assert_eq!(attitude.version, 0x4698);

        let atmosphere = set.atmosphere.unwrap();
        assert_relative_eq!(atmosphere.pressure, 101_325.0);
        assert_relative_eq!(atmosphere.altitude, 42.5, epsilon = 1e-9);

        let position = set.gps_position.unwrap();
        assert_relative_eq!(position.latitude, 22.0 + 32.12345 / 60.0, epsilon = 1e-9);
        assert_relative_eq!(position.longitude, 113.0 + 56.789 / 60.0, epsilon = 1e-9);

        let speed = set.gps_speed.unwrap();
        assert_relative_eq!(speed.altitude, 50.5, epsilon = 1e-9);
        assert_relative_eq!(speed.course, 90.0, epsilon = 1e-9);
        assert_relative_eq!(speed.speed_kmh, 18.0, epsilon = 1e-9);

        let q = set.quaternion.unwrap();
        assert_relative_eq!(q.q0, 0.5);
        assert_relative_eq!(q.q1, -0.5);
        assert_relative_eq!(q.q2, 0.5);
        assert_relative_eq!(q.q3, 0.0);

        let accuracy = set.satellite_accuracy.unwrap();
        assert_eq!(accuracy.satellites, 11);
        assert_relative_eq!(accuracy.pdop, 0.125);
        assert_relative_eq!(accuracy.hdop, 0.25);
        assert_relative_eq!(accuracy.vdop, 0.5);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = DatasetDecoder::default().decode(&[0u8; 5]).unwrap_err();
        assert_eq!(err, DecodeError::TooShort { len: 5 });
    }

    #[test]
    fn test_time_only_dataset() {
        let buf = full_dataset();
        let set = DatasetDecoder::default().decode(&buf[..9]).unwrap();
        assert_eq!(set.present(), vec![SubRecordKind::Clock]);
    }

    #[test]
    fn test_truncated_record_is_absent_not_default() {
        let buf = full_dataset();
        // Cut the angle record one byte short of its checksum
        let set = DatasetDecoder::default().decode(&buf[..41]).unwrap();
        assert_eq!(
            set.present(),
            vec![
                SubRecordKind::Clock,
                SubRecordKind::Acceleration,
                SubRecordKind::AngularVelocity
            ]
        );
        assert!(set.attitude.is_none());

        let set = DatasetDecoder::default().decode(&buf[..42]).unwrap();
        assert!(set.attitude.is_some());
    }

    #[test]
    fn test_checksum_not_enforced_by_default() {
        let mut buf = full_dataset();
        buf[SubRecordKind::Angle.end() - 1] ^= 0xFF;

        let set = DatasetDecoder::default().decode(&buf).unwrap();
        assert!(set.attitude.is_some());
        assert_eq!(set.issues.len(), 1);
        assert_eq!(set.issues[0].record, SubRecordKind::Angle);
        assert!(matches!(
            set.issues[0].kind,
            IssueKind::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn test_enforced_checksum_drops_dataset() {
        let mut buf = full_dataset();
        buf[SubRecordKind::Quaternion.offset() + 3] ^= 0x01;

        let decoder = DatasetDecoder::new(DecodeOptions {
            enforce_checksum: true,
            ..Default::default()
        });
        match decoder.decode(&buf) {
            Err(DecodeError::ChecksumMismatch { record, .. }) => {
                assert_eq!(record, SubRecordKind::Quaternion)
            }
            other => panic!("Expected checksum mismatch, got {other:?}"),
        }

        // An intact dataset still passes under enforcement
        assert!(decoder.decode(&full_dataset()).is_ok());
    }

    #[test]
    fn test_unexpected_marker_reported() {
        let mut buf = full_dataset();
        // Claim the angle slot holds a magnetometer record
        buf[SubRecordKind::Angle.offset() + 1] = 0x54;

        let set = DatasetDecoder::default().decode(&buf).unwrap();
        assert!(set.attitude.is_none());
        assert!(set.atmosphere.is_some());
        assert_eq!(
            set.issues,
            vec![SubRecordIssue {
                record: SubRecordKind::Angle,
                offset: 31,
                kind: IssueKind::UnknownMarker {
                    found: [0x55, 0x54]
                },
            }]
        );
    }

    #[test]
    fn test_marker_validation_can_be_disabled() {
        let mut buf = full_dataset();
        buf[SubRecordKind::Angle.offset() + 1] = 0x54;

        let decoder = DatasetDecoder::new(DecodeOptions {
            validate_markers: false,
            ..Default::default()
        });
        let set = decoder.decode(&buf).unwrap();
        assert!(set.attitude.is_some());
    }

    #[test]
    fn test_pressure_in_hectopascal() {
        let decoder = DatasetDecoder::new(DecodeOptions {
            pressure_unit: PressureUnit::Hectopascal,
            ..Default::default()
        });
        let set = decoder.decode(&full_dataset()).unwrap();
        assert_relative_eq!(set.atmosphere.unwrap().pressure, 1013.25, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_offset_applies() {
        let decoder = DatasetDecoder::default().with_heading_offset(100.0);
        let set = decoder.decode(&full_dataset()).unwrap();
        // 360 - 90 + 100 = 370 -> 10 degrees
        assert_relative_eq!(
            set.attitude.unwrap().heading,
            10.0_f64.to_radians(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_decode_options_from_partial_json() {
        let options: DecodeOptions =
            serde_json::from_str(r#"{"pressure_unit": "hectopascal"}"#).unwrap();
        assert!(!options.enforce_checksum);
        assert!(options.validate_markers);
        assert_eq!(options.pressure_unit, PressureUnit::Hectopascal);
    }
}
