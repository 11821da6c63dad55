//! Serial bridge for WitMotion IMU/GNSS sensors.
//!
//! Opens one serial link per configured sensor, decodes its dataset stream
//! with the `witmotion` crate, and publishes the measurements as path/value
//! deltas. Each device also gets a one-shot configuration script (output
//! rate, output set, optional calibration and angle reset) and reconnects
//! with exponential backoff after link errors.
//!
//! Devices are independent: each runs as its own task with its own link,
//! backoff and timers. See [`runtime::Bridge`].

pub mod backoff;
pub mod config;
pub mod connection;
pub mod link;
pub mod publisher;
pub mod runtime;
pub mod sequencer;
pub mod serial;
pub mod status;

pub use backoff::Backoff;
pub use config::{BridgeConfig, ConfigError, DeviceConfig, DeviceIndex};
pub use connection::{ConnectionManager, ConnectionState};
pub use link::{Link, LinkError, LinkEvent, LinkEventSender, LinkOpener};
pub use publisher::{Delta, JsonLinesPublisher, PathValue, TelemetryPublisher, TracingPublisher, Value};
pub use runtime::{Bridge, BridgeEvent, DeviceHandle, DeviceRuntime};
pub use sequencer::{ConfigPlan, Sequencer, Stage, StageKind};
pub use serial::SerialOpener;
pub use status::{DeviceStatus, StatusLog, StatusSink, TracingStatusSink};
