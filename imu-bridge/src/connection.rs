//! Link lifecycle for a single device.
//!
//! The manager owns the device's link and reconnect backoff. It does not
//! sleep or spawn anything itself: it records when the next reconnect is
//! due and the device task waits for that deadline.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::backoff::Backoff;
use crate::link::{Link, LinkError, LinkOpener};
use crate::status::DeviceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ReconnectPending,
}

#[derive(Debug)]
pub struct ConnectionManager {
    address: String,
    state: ConnectionState,
    backoff: Backoff,
    link: Option<Link>,
    reconnect_at: Option<Instant>,
    reconnect_on_close: bool,
}

impl ConnectionManager {
    pub fn new(address: impl Into<String>, reconnect_on_close: bool) -> Self {
        Self {
            address: address.into(),
            state: ConnectionState::Disconnected,
            backoff: Backoff::new(),
            link: None,
            reconnect_at: None,
            reconnect_on_close,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn link(&mut self) -> Option<&mut Link> {
        self.link.as_mut()
    }

    /// Slot holding the current link, for waiting on its events.
    pub fn link_slot(&mut self) -> &mut Option<Link> {
        &mut self.link
    }

    /// When the pending reconnect attempt is due.
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Open the link. On failure a reconnect is scheduled.
    ///
    /// Returns the status reports produced by the attempt, in order.
    pub fn connect(&mut self, opener: &dyn LinkOpener, now: Instant) -> Vec<DeviceStatus> {
        self.state = ConnectionState::Connecting;
        self.reconnect_at = None;
        let mut reports = vec![DeviceStatus::Connecting {
            address: self.address.clone(),
        }];

        match opener.open(&self.address) {
            Ok(link) => {
                debug!("Opened {}", self.address);
                self.link = Some(link);
                self.backoff.reset();
                self.state = ConnectionState::Connected;
                reports.push(DeviceStatus::Connected {
                    address: self.address.clone(),
                });
            }
            Err(e) => {
                let reason = match e {
                    LinkError::OpenFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                reports.push(DeviceStatus::OpenFailed { reason });
                reports.push(self.schedule_reconnect(now));
            }
        }
        reports
    }

    /// The link reported an I/O error; drop it and schedule a reconnect.
    pub fn link_failed(&mut self, error: &std::io::Error, now: Instant) -> Vec<DeviceStatus> {
        self.link = None;
        vec![
            DeviceStatus::LinkError {
                reason: error.to_string(),
            },
            self.schedule_reconnect(now),
        ]
    }

    /// The link closed without an error.
    pub fn link_closed(&mut self, now: Instant) -> Vec<DeviceStatus> {
        self.link = None;
        let mut reports = vec![DeviceStatus::Closed];
        if self.reconnect_on_close {
            reports.push(self.schedule_reconnect(now));
        } else {
            self.state = ConnectionState::Disconnected;
        }
        reports
    }

    /// Close the link and cancel any pending reconnect.
    pub fn disconnect(&mut self) {
        self.link = None;
        self.reconnect_at = None;
        self.state = ConnectionState::Disconnected;
    }

    fn schedule_reconnect(&mut self, now: Instant) -> DeviceStatus {
        let delay: Duration = self.backoff.fail();
        self.reconnect_at = Some(now + delay);
        self.state = ConnectionState::ReconnectPending;
        debug!("Reconnecting {} in {delay:?}", self.address);
        DeviceStatus::ReconnectScheduled { delay }
    }
}
