//! Telemetry publishing.
//!
//! Each decoded dataset becomes one [`Delta`]: a source label plus a list of
//! path/value pairs in SI units (radians, m/s, kelvin).

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, warn};
use witmotion::MeasurementSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Integer(i64),
    Text(String),
    Object(BTreeMap<&'static str, f64>),
}

impl Value {
    fn object<const N: usize>(fields: [(&'static str, f64); N]) -> Self {
        Value::Object(fields.into_iter().collect())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub source: String,
    pub values: Vec<PathValue>,
}

impl Delta {
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.iter().find(|pv| pv.path == path).map(|pv| &pv.value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Map a decoded dataset to publishable paths.
    pub fn from_measurements(source: &str, set: &MeasurementSet) -> Self {
        let mut values = Vec::new();
        let mut push = |path: &'static str, value: Value| values.push(PathValue { path, value });

        if let Some(text) = set.time.and_then(|t| t.to_iso8601()) {
            push("navigation.datetime", Value::Text(text));
        }
        if let Some(a) = set.acceleration {
            push("navigation.linearAcceleration.x", Value::Number(a.x));
            push("navigation.linearAcceleration.y", Value::Number(a.y));
            push("navigation.linearAcceleration.z", Value::Number(a.z));
            push("environment.inside.temperature", Value::Number(a.temperature));
        }
        if let Some(w) = set.angular_velocity {
            push("navigation.angularVelocity.x", Value::Number(w.x.to_radians()));
            push("navigation.angularVelocity.y", Value::Number(w.y.to_radians()));
            push("navigation.angularVelocity.z", Value::Number(w.z.to_radians()));
        }
        if let Some(a) = set.attitude {
            push(
                "navigation.attitude",
                Value::object([("roll", a.roll), ("pitch", a.pitch), ("yaw", a.yaw)]),
            );
            push("navigation.headingMagnetic", Value::Number(a.heading));
        }
        if let Some(a) = set.atmosphere {
            push("environment.outside.pressure", Value::Number(a.pressure));
            push("navigation.altitude", Value::Number(a.altitude));
        }
        if let Some(p) = set.gps_position {
            let mut position =
                BTreeMap::from([("latitude", p.latitude), ("longitude", p.longitude)]);
            if let Some(s) = set.gps_speed {
                position.insert("altitude", s.altitude);
            }
            push("navigation.position", Value::Object(position));
        }
        if let Some(s) = set.gps_speed {
            push("navigation.courseOverGroundTrue", Value::Number(s.course_rad()));
            push("navigation.speedOverGround", Value::Number(s.speed_mps()));
        }
        if let Some(q) = set.quaternion {
            push(
                "navigation.attitude.quaternion",
                Value::object([("w", q.q0), ("x", q.q1), ("y", q.q2), ("z", q.q3)]),
            );
        }
        if let Some(s) = set.satellite_accuracy {
            push("navigation.gnss.satellites", Value::Integer(s.satellites.into()));
            push("navigation.gnss.pdop", Value::Number(s.pdop));
            push("navigation.gnss.hdop", Value::Number(s.hdop));
            push("navigation.gnss.vdop", Value::Number(s.vdop));
        }

        Self {
            source: source.to_string(),
            values,
        }
    }
}

pub trait TelemetryPublisher {
    fn publish(&mut self, delta: &Delta);
}

/// Writes one JSON object per delta, newline separated.
pub struct JsonLinesPublisher<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TelemetryPublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, delta: &Delta) {
        let result = serde_json::to_writer(&mut self.out, delta)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to publish delta from {}: {e}", delta.source);
        }
    }
}

/// Logs each delta at debug level.
#[derive(Debug, Default)]
pub struct TracingPublisher;

impl TelemetryPublisher for TracingPublisher {
    fn publish(&mut self, delta: &Delta) {
        for pv in &delta.values {
            debug!("{} {} = {:?}", delta.source, pv.path, pv.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use witmotion::{
        Acceleration, Attitude, GpsPosition, GpsSpeed, SatelliteAccuracy, SensorTime,
    };

    fn sample_set() -> MeasurementSet {
        MeasurementSet {
            time: Some(SensorTime {
                year: 2024,
                month: 3,
                day: 9,
                hour: 12,
                minute: 30,
                second: 5,
                millisecond: 250,
            }),
            acceleration: Some(Acceleration {
                x: 0.1,
                y: -0.2,
                z: 9.8,
                temperature: 300.15,
            }),
            attitude: Some(Attitude {
                roll: 0.0,
                pitch: 0.1,
                yaw: 1.0,
                heading: 5.0,
                version: 1,
            }),
            gps_position: Some(GpsPosition {
                latitude: 60.5,
                longitude: 24.25,
            }),
            gps_speed: Some(GpsSpeed {
                altitude: 12.0,
                course: 90.0,
                speed_kmh: 36.0,
            }),
            satellite_accuracy: Some(SatelliteAccuracy {
                satellites: 9,
                pdop: 1.5,
                hdop: 0.9,
                vdop: 1.2,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_paths_and_units() {
        let delta = Delta::from_measurements("witmotion.0", &sample_set());
        assert_eq!(delta.source, "witmotion.0");
        assert_eq!(
            delta.get("navigation.datetime"),
            Some(&Value::Text("2024-03-09T12:30:05.250Z".to_string()))
        );
        assert_eq!(
            delta.get("environment.inside.temperature").and_then(Value::as_f64),
            Some(300.15)
        );
        assert_eq!(
            delta.get("navigation.headingMagnetic").and_then(Value::as_f64),
            Some(5.0)
        );
        assert_relative_eq!(
            delta
                .get("navigation.speedOverGround")
                .and_then(Value::as_f64)
                .unwrap(),
            10.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            delta
                .get("navigation.courseOverGroundTrue")
                .and_then(Value::as_f64)
                .unwrap(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );
        assert_eq!(
            delta.get("navigation.gnss.satellites"),
            Some(&Value::Integer(9))
        );

        let Some(Value::Object(position)) = delta.get("navigation.position") else {
            panic!("position missing");
        };
        assert_eq!(position["latitude"], 60.5);
        assert_eq!(position["altitude"], 12.0);
    }

    #[test]
    fn test_absent_records_have_no_paths() {
        let delta = Delta::from_measurements("imu", &MeasurementSet::default());
        assert!(delta.is_empty());

        let delta = Delta::from_measurements("imu", &sample_set());
        assert!(delta.get("navigation.angularVelocity.x").is_none());
        assert!(delta.get("environment.outside.pressure").is_none());
    }

    #[test]
    fn test_json_lines_output() {
        let mut publisher = JsonLinesPublisher::new(Vec::new());
        let delta = Delta {
            source: "imu".to_string(),
            values: vec![
                PathValue {
                    path: "navigation.headingMagnetic",
                    value: Value::Number(1.5),
                },
                PathValue {
                    path: "navigation.attitude",
                    value: Value::object([("roll", 0.0), ("pitch", 0.5), ("yaw", 1.0)]),
                },
            ],
        };
        publisher.publish(&delta);
        publisher.publish(&delta);

        let text = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "source": "imu",
                "values": [
                    {"path": "navigation.headingMagnetic", "value": 1.5},
                    {"path": "navigation.attitude",
                     "value": {"pitch": 0.5, "roll": 0.0, "yaw": 1.0}}
                ]
            })
        );
    }
}
