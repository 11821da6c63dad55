//! Temperature decoding for WitMotion motion sub-records.
//!
//! Acceleration and angular velocity records both carry the die temperature
//! as a signed count of hundredths of a degree Celsius. It is always
//! reported in kelvin.

const KELVIN_OFFSET: f64 = 273.15;

/// Convert raw hundredths of a degree Celsius to kelvin.
pub fn raw_to_kelvin(raw: i16) -> f64 {
    raw as f64 / 100.0 + KELVIN_OFFSET
}

/// Convert kelvin back to degrees Celsius.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_room_temperature() {
        assert_relative_eq!(raw_to_kelvin(2512), 298.27, epsilon = 1e-9);
    }

    #[test]
    fn test_below_freezing() {
        assert_relative_eq!(raw_to_kelvin(-1050), 262.65, epsilon = 1e-9);
        assert_relative_eq!(kelvin_to_celsius(raw_to_kelvin(-1050)), -10.5, epsilon = 1e-9);
    }
}
