//! Per-device tasks and the bridge that owns them.
//!
//! Every configured device gets one tokio task. The task owns the device's
//! connection, frame splitter, decoder and configuration script outright and
//! waits on exactly three things: the next link event, the reconnect
//! deadline, and the next configuration write. Telemetry and status reports
//! flow back to the host over a single channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};
use witmotion::{DatasetDecoder, DecodeOptions, FrameSplitter};

use crate::config::{BridgeConfig, ConfigError, DeviceConfig, DeviceIndex};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::link::{Link, LinkEvent, LinkOpener};
use crate::publisher::{Delta, TelemetryPublisher};
use crate::sequencer::{ConfigPlan, Sequencer};
use crate::status::{DeviceStatus, StatusSink};

/// Output of a device task.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Telemetry(Delta),
    Status {
        device: DeviceIndex,
        status: DeviceStatus,
    },
}

enum Wake {
    Link(LinkEvent),
    Reconnect,
    Configure,
}

async fn next_link_event(link: &mut Option<Link>) -> LinkEvent {
    match link {
        Some(link) => link.next_event().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Everything one device needs, owned by its task.
pub struct DeviceRuntime {
    index: DeviceIndex,
    source: String,
    connection: ConnectionManager,
    splitter: FrameSplitter,
    decoder: DatasetDecoder,
    sequencer: Sequencer,
    events: mpsc::UnboundedSender<BridgeEvent>,
}

impl DeviceRuntime {
    /// Build the runtime and plan its configuration script.
    ///
    /// The device's one-shot action flags are cleared here.
    pub fn new(
        index: DeviceIndex,
        device: &mut DeviceConfig,
        options: DecodeOptions,
        reconnect_on_close: bool,
        events: mpsc::UnboundedSender<BridgeEvent>,
    ) -> Self {
        let plan = ConfigPlan::for_device(device);
        debug!(
            "Device {index}: planned {} configuration stage(s)",
            plan.stages.len()
        );
        Self {
            index,
            source: device.source_label(index),
            connection: ConnectionManager::new(device.address.clone(), reconnect_on_close),
            splitter: FrameSplitter::new(),
            decoder: DatasetDecoder::new(options).with_heading_offset(device.heading_offset),
            sequencer: Sequencer::new(plan),
            events,
        }
    }

    pub fn index(&self) -> DeviceIndex {
        self.index
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    fn report(&self, status: DeviceStatus) {
        let _ = self.events.send(BridgeEvent::Status {
            device: self.index,
            status,
        });
    }

    fn report_all(&self, reports: Vec<DeviceStatus>) {
        for status in reports {
            self.report(status);
        }
    }

    fn connect(&mut self, opener: &dyn LinkOpener, now: Instant) {
        let reports = self.connection.connect(opener, now);
        if self.connection.state() == ConnectionState::Connected {
            self.splitter.reset();
            self.sequencer.link_opened(now);
        }
        self.report_all(reports);
    }

    /// Split, decode and publish everything `data` completes.
    pub fn handle_data(&mut self, data: &Bytes) {
        self.splitter.push(data);
        while let Some(frame) = self.splitter.next_frame() {
            match self.decoder.decode(&frame) {
                Ok(set) => {
                    for issue in &set.issues {
                        debug!("Device {}: {issue}", self.index);
                    }
                    let delta = Delta::from_measurements(&self.source, &set);
                    if !delta.is_empty() {
                        let _ = self.events.send(BridgeEvent::Telemetry(delta));
                    }
                }
                Err(e) => self.report(DeviceStatus::DatasetDropped {
                    reason: e.to_string(),
                }),
            }
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent, now: Instant) {
        match event {
            LinkEvent::Data(data) => self.handle_data(&data),
            LinkEvent::Error(e) => {
                self.sequencer.link_lost();
                let reports = self.connection.link_failed(&e, now);
                self.report_all(reports);
            }
            LinkEvent::Closed => {
                self.sequencer.link_lost();
                info!("Device {}: {} closed", self.index, self.connection.address());
                let reports = self.connection.link_closed(now);
                self.report_all(reports);
            }
        }
    }

    fn run_configuration(&mut self, now: Instant) {
        let was_finished = self.sequencer.is_finished();
        for command in self.sequencer.due(now) {
            let Some(link) = self.connection.link() else {
                break;
            };
            if let Err(e) = link.write_command(command) {
                self.report(DeviceStatus::CommandFailed {
                    command: command.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        if !was_finished && self.sequencer.is_finished() {
            self.report(DeviceStatus::Configured);
        }
    }

    /// Drive the device until it is permanently disconnected.
    pub async fn run(mut self, opener: Arc<dyn LinkOpener>) {
        self.connect(opener.as_ref(), Instant::now());

        loop {
            let reconnect_at = self.connection.reconnect_deadline();
            let configure_at = self.sequencer.deadline();
            if reconnect_at.is_none() && self.connection.link().is_none() {
                info!("Device {}: stopped", self.index);
                return;
            }

            let wake = tokio::select! {
                biased;
                event = next_link_event(self.connection.link_slot()) => Wake::Link(event),
                _ = sleep_until_opt(reconnect_at) => Wake::Reconnect,
                _ = sleep_until_opt(configure_at) => Wake::Configure,
            };

            let now = Instant::now();
            match wake {
                Wake::Link(event) => self.handle_link_event(event, now),
                Wake::Reconnect => self.connect(opener.as_ref(), now),
                Wake::Configure => self.run_configuration(now),
            }
        }
    }
}

pub struct DeviceHandle {
    pub address: String,
    task: JoinHandle<()>,
}

impl DeviceHandle {
    /// True once the device has stopped for good.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Owns every device task.
///
/// Dropping the bridge aborts the tasks, which cancels their timers and
/// closes their links.
pub struct Bridge {
    devices: BTreeMap<DeviceIndex, DeviceHandle>,
    events: mpsc::UnboundedReceiver<BridgeEvent>,
}

impl Bridge {
    /// Spawn one task per configured device. Must run inside a tokio runtime.
    ///
    /// Configuration scripts are planned before this returns, so the
    /// one-shot flags in `config` are already cleared whether or not any
    /// link ever opens.
    pub fn start(
        config: &mut BridgeConfig,
        opener: Arc<dyn LinkOpener>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let options = config.decoder;
        let reconnect_on_close = config.reconnect_on_close;

        let mut devices = BTreeMap::new();
        for (i, device) in config.devices.iter_mut().enumerate() {
            let index = DeviceIndex(i);
            let runtime = DeviceRuntime::new(index, device, options, reconnect_on_close, tx.clone());
            let task = tokio::spawn(runtime.run(opener.clone()));
            devices.insert(
                index,
                DeviceHandle {
                    address: device.address.clone(),
                    task,
                },
            );
        }
        info!("Started {} device(s)", devices.len());

        Ok(Self {
            devices,
            events: rx,
        })
    }

    pub fn devices(&self) -> &BTreeMap<DeviceIndex, DeviceHandle> {
        &self.devices
    }

    /// Wait for the next event. `None` once every device has stopped.
    pub async fn next_event(&mut self) -> Option<BridgeEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<BridgeEvent> {
        self.events.try_recv().ok()
    }

    /// Route events to the publisher and status sink until every device
    /// has stopped.
    pub async fn run(
        &mut self,
        publisher: &mut dyn TelemetryPublisher,
        status: &mut dyn StatusSink,
    ) {
        while let Some(event) = self.next_event().await {
            dispatch(event, publisher, status);
        }
    }

    /// Abort every device task.
    pub fn shutdown(&mut self) {
        for (index, handle) in std::mem::take(&mut self.devices) {
            debug!("Stopping device {index} ({})", handle.address);
            handle.task.abort();
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn dispatch(
    event: BridgeEvent,
    publisher: &mut dyn TelemetryPublisher,
    status: &mut dyn StatusSink,
) {
    match event {
        BridgeEvent::Telemetry(delta) => publisher.publish(&delta),
        BridgeEvent::Status {
            device,
            status: report,
        } => status.report(device, &report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusLog;
    use witmotion::records::{AccelerationPacket, ClockPacket};
    use witmotion::FRAME_MARKER;

    fn runtime() -> (DeviceRuntime, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut device = DeviceConfig::new("/dev/null");
        let runtime = DeviceRuntime::new(DeviceIndex(3), &mut device, DecodeOptions::default(), false, tx);
        (runtime, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<BridgeEvent>) -> Vec<BridgeEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_data_published_per_frame() {
        let (mut runtime, mut rx) = runtime();
        let mut stream = FRAME_MARKER.to_vec();
        stream.extend_from_slice(bytemuck::bytes_of(&ClockPacket::new(24, 1, 2, 3, 4, 5, 0)));
        stream.extend_from_slice(bytemuck::bytes_of(&AccelerationPacket::new(0, 0, 2048, 0)));
        stream.extend_from_slice(&FRAME_MARKER);

        runtime.handle_data(&Bytes::from(stream));
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        let BridgeEvent::Telemetry(delta) = &events[0] else {
            panic!("expected telemetry, got {events:?}");
        };
        assert_eq!(delta.source, "witmotion.3");
        assert!(delta.get("navigation.linearAcceleration.z").is_some());
    }

    #[test]
    fn test_short_frame_reported_as_dropped() {
        let (mut runtime, mut rx) = runtime();
        runtime.handle_data(&Bytes::from_static(&[0x55, 0x50, 1, 2, 3, 0x55, 0x50]));
        let events = drain(&mut rx);
        assert!(matches!(
            &events[..],
            [BridgeEvent::Status {
                device: DeviceIndex(3),
                status: DeviceStatus::DatasetDropped { .. }
            }]
        ));
    }

    #[test]
    fn test_dispatch_routes_status() {
        struct Discard;
        impl TelemetryPublisher for Discard {
            fn publish(&mut self, _delta: &Delta) {}
        }

        let mut log = StatusLog::default();
        dispatch(
            BridgeEvent::Status {
                device: DeviceIndex(1),
                status: DeviceStatus::Closed,
            },
            &mut Discard,
            &mut log,
        );
        assert_eq!(log.entries, vec![(DeviceIndex(1), DeviceStatus::Closed)]);
    }
}
