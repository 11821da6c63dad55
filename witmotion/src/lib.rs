//! WitMotion serial IMU/GNSS protocol decoding
//!
//! This crate turns the raw byte stream emitted by a WitMotion-family
//! inertial/GNSS sensor into physical measurements, and encodes the
//! configuration commands the sensor accepts. It performs no I/O.
//!
//! The sensor emits a burst of 11-byte sub-records per output period. The
//! stream is cut into datasets on the time sub-record marker (`55 50`), so
//! every dataset starts with the time payload followed by the remaining
//! sub-records at fixed offsets.

pub mod angle;
pub mod checksum;
pub mod command;
pub mod dataset;
pub mod framing;
pub mod records;
pub mod temperature;
pub mod time;

pub use angle::{heading_rad, raw_to_degrees, to_rad, DEGREES_PER_LSB};
pub use checksum::{compute_checksum, Checksummed};
pub use command::{Command, OutputContent, OutputRate, DEFAULT_OUTPUT_CONTENT};
pub use dataset::{
    DatasetDecoder, DecodeError, DecodeOptions, IssueKind, MeasurementSet, PressureUnit,
    SubRecordIssue, MIN_DATASET_LEN,
};
pub use framing::{FrameSplitter, FRAME_MARKER};
pub use records::{
    Acceleration, AngularVelocity, Atmosphere, Attitude, GpsPosition, GpsSpeed, Quaternion,
    SatelliteAccuracy, SubRecordKind,
};
pub use time::SensorTime;
