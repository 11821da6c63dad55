//! Bridge configuration.
//!
//! Configuration is supplied by the host as JSON. The bridge never writes it
//! back; the one-shot action flags are cleared in memory once their command
//! sequence has been planned, and the host decides whether to persist that.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use witmotion::{DecodeOptions, OutputRate};

/// Default serial baud rate for WitMotion sensors.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown output rate {0:?}, expected one of 0.2Hz, 0.5Hz, 1Hz, 2Hz, 5Hz, 10Hz, 20Hz, 50Hz")]
    UnknownRate(String),

    #[error("No devices configured")]
    NoDevices,

    #[error("Device {0} has an empty address")]
    EmptyAddress(DeviceIndex),
}

/// Position of a device in the configured device list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceIndex(pub usize);

impl fmt::Display for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial port path, e.g. `/dev/ttyUSB0`
    pub address: String,

    #[serde(default)]
    pub rate: OutputRate,

    /// Degrees added to the magnetic heading, nominally -180..180
    #[serde(default)]
    pub heading_offset: f64,

    /// Run accelerometer calibration once after connecting
    #[serde(default)]
    pub calibrate: bool,

    /// Reset the angle reference once after connecting
    #[serde(default)]
    pub reset_angle: bool,

    /// Source label attached to published telemetry
    #[serde(default)]
    pub source: Option<String>,
}

impl DeviceConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rate: OutputRate::default(),
            heading_offset: 0.0,
            calibrate: false,
            reset_angle: false,
            source: None,
        }
    }

    /// Build from command line strings.
    pub fn from_args(address: &str, rate: &str) -> Result<Self, ConfigError> {
        let rate =
            OutputRate::from_str(rate).map_err(|_| ConfigError::UnknownRate(rate.to_string()))?;
        Ok(Self {
            rate,
            ..Self::new(address)
        })
    }

    pub fn source_label(&self, index: DeviceIndex) -> String {
        self.source
            .clone()
            .unwrap_or_else(|| format!("witmotion.{index}"))
    }
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

/// Top-level configuration for all devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub devices: Vec<DeviceConfig>,

    #[serde(default)]
    pub decoder: DecodeOptions,

    /// Reconnect after the port closes without an error.
    #[serde(default)]
    pub reconnect_on_close: bool,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

impl BridgeConfig {
    pub fn new(devices: Vec<DeviceConfig>) -> Self {
        Self {
            devices,
            decoder: DecodeOptions::default(),
            reconnect_on_close: false,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject configurations the bridge cannot run; warn on suspicious ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        for (i, device) in self.devices.iter().enumerate() {
            if device.address.trim().is_empty() {
                return Err(ConfigError::EmptyAddress(DeviceIndex(i)));
            }
            if !(-180.0..=180.0).contains(&device.heading_offset) {
                warn!(
                    "Device {i} heading offset {} is outside -180..180",
                    device.heading_offset
                );
            }
        }
        Ok(())
    }
}
