//! Angle decoding for WitMotion attitude sub-records
//!
//! Attitude fields are unsigned 16-bit counts spanning a full turn, so
//! 32768 counts correspond to 180 degrees.

use std::f64::consts::PI;

/// Conversion factor from LSB to degrees
pub const DEGREES_PER_LSB: f64 = 180.0 / 32768.0;

const RAD_PER_DEG: f64 = PI / 180.0;

/// Convert a raw angle count to degrees in `[0, 360)` without wrapping.
pub fn raw_to_degrees(raw: u16) -> f64 {
    raw as f64 * DEGREES_PER_LSB
}

/// Wrap a `[0, 360)` angle into `(-180, 180]` degrees.
pub fn wrap_degrees(degrees: f64) -> f64 {
    if degrees > 180.0 {
        degrees - 360.0
    } else {
        degrees
    }
}

/// Convert a raw angle count to radians in `(-π, π]`.
pub fn to_rad(raw: u16) -> f64 {
    wrap_degrees(raw_to_degrees(raw)) * RAD_PER_DEG
}

/// Magnetic heading in radians from the raw yaw count.
///
/// The sensor's yaw grows counter-clockwise, heading grows clockwise, so
/// `hdm = 360 - yaw + offset`, folded back by one turn when it exceeds 360.
/// The unwrapped yaw is used here; a wrapped yaw would give a different
/// result for yaw above 180 degrees with a non-zero offset.
pub fn heading_rad(yaw_raw: u16, heading_offset_deg: f64) -> f64 {
    let hdm = 360.0 - raw_to_degrees(yaw_raw) + heading_offset_deg;
    if hdm > 360.0 {
        (hdm - 360.0) * RAD_PER_DEG
    } else {
        hdm * RAD_PER_DEG
    }
}
