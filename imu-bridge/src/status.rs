//! Per-device status reporting.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::DeviceIndex;

/// Something the host should know about a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeviceStatus {
    Connecting { address: String },
    Connected { address: String },
    OpenFailed { reason: String },
    LinkError { reason: String },
    /// The link closed cleanly.
    Closed,
    ReconnectScheduled {
        #[serde(rename = "delay_ms", serialize_with = "as_millis")]
        delay: Duration,
    },
    CommandFailed { command: String, reason: String },
    DatasetDropped { reason: String },
    /// The one-shot configuration script has finished.
    Configured,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl DeviceStatus {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DeviceStatus::OpenFailed { .. }
                | DeviceStatus::LinkError { .. }
                | DeviceStatus::CommandFailed { .. }
        )
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Connecting { address } => write!(f, "connecting to {address}"),
            DeviceStatus::Connected { address } => write!(f, "connected to {address}"),
            DeviceStatus::OpenFailed { reason } => write!(f, "open failed: {reason}"),
            DeviceStatus::LinkError { reason } => write!(f, "link error: {reason}"),
            DeviceStatus::Closed => write!(f, "link closed"),
            DeviceStatus::ReconnectScheduled { delay } => {
                write!(f, "reconnecting in {} ms", delay.as_millis())
            }
            DeviceStatus::CommandFailed { command, reason } => {
                write!(f, "{command} failed: {reason}")
            }
            DeviceStatus::DatasetDropped { reason } => write!(f, "dataset dropped: {reason}"),
            DeviceStatus::Configured => write!(f, "configuration complete"),
        }
    }
}

/// Receives device status reports.
pub trait StatusSink {
    fn report(&mut self, device: DeviceIndex, status: &DeviceStatus);
}

/// Logs status reports; errors at warn, everything else at info.
#[derive(Debug, Default)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn report(&mut self, device: DeviceIndex, status: &DeviceStatus) {
        if status.is_error() {
            warn!("Device {device}: {status}");
        } else {
            info!("Device {device}: {status}");
        }
    }
}

/// Keeps every report, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct StatusLog {
    pub entries: Vec<(DeviceIndex, DeviceStatus)>,
}

impl StatusLog {
    pub fn for_device(&self, device: DeviceIndex) -> impl Iterator<Item = &DeviceStatus> {
        self.entries
            .iter()
            .filter(move |(d, _)| *d == device)
            .map(|(_, s)| s)
    }
}

impl StatusSink for StatusLog {
    fn report(&mut self, device: DeviceIndex, status: &DeviceStatus) {
        self.entries.push((device, status.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            DeviceStatus::ReconnectScheduled {
                delay: Duration::from_millis(1500)
            }
            .to_string(),
            "reconnecting in 1500 ms"
        );
        assert_eq!(
            DeviceStatus::Connected {
                address: "/dev/ttyUSB0".into()
            }
            .to_string(),
            "connected to /dev/ttyUSB0"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(DeviceStatus::ReconnectScheduled {
            delay: Duration::from_millis(2250),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "reconnect_scheduled", "delay_ms": 2250})
        );
    }

    #[test]
    fn test_status_log_filters_by_device() {
        let mut log = StatusLog::default();
        log.report(DeviceIndex(0), &DeviceStatus::Closed);
        log.report(DeviceIndex(1), &DeviceStatus::Configured);
        log.report(DeviceIndex(0), &DeviceStatus::Configured);

        let zero: Vec<_> = log.for_device(DeviceIndex(0)).cloned().collect();
        assert_eq!(zero, vec![DeviceStatus::Closed, DeviceStatus::Configured]);
    }

    #[test]
    fn test_error_classification() {
        assert!(DeviceStatus::OpenFailed { reason: "x".into() }.is_error());
        assert!(!DeviceStatus::Closed.is_error());
    }
}
