//! On-chip clock reported by the time sub-record

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Calendar time as reported by the sensor's real-time clock.
///
/// The sensor sends a two-digit year; `year` here is already offset by 2000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl SensorTime {
    /// Convert to a calendar date-time.
    ///
    /// Returns `None` when the fields do not form a valid date, which is
    /// what the sensor reports before its clock has been set.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_milli_opt(
                self.hour as u32,
                self.minute as u32,
                self.second as u32,
                self.millisecond as u32,
            )
    }

    /// ISO 8601 representation with millisecond precision and a `Z` suffix.
    pub fn to_iso8601(&self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn sample() -> SensorTime {
        SensorTime {
            year: 2024,
            month: 3,
            day: 14,
            hour: 12,
            minute: 30,
            second: 45,
            millisecond: 500,
        }
    }

    #[test]
    fn test_to_datetime() {
        let dt = sample().to_datetime().unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.second(), 45);
        assert_eq!(dt.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_to_iso8601() {
        assert_eq!(
            sample().to_iso8601().as_deref(),
            Some("2024-03-14T12:30:45.500Z")
        );
    }

    #[test]
    fn test_unset_clock_is_invalid() {
        let time = SensorTime {
            month: 0,
            day: 0,
            ..sample()
        };
        assert!(time.to_datetime().is_none());
    }
}
