//! Byte links to a sensor.
//!
//! A [`Link`] is an open, full-duplex byte stream: commands are written
//! synchronously through a writer, and inbound traffic arrives as
//! [`LinkEvent`]s on a channel fed by whatever owns the read side.

use std::io::Write;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;
use witmotion::Command;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Failed to open {address}: {reason}")]
    OpenFailed { address: String, reason: String },

    #[error("Link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Link is not open")]
    NotOpen,
}

/// Inbound traffic from an open link.
#[derive(Debug)]
pub enum LinkEvent {
    Data(Bytes),
    Error(std::io::Error),
    /// The far end closed the link without an error.
    Closed,
}

/// Sender half handed to the read side of a link.
pub type LinkEventSender = mpsc::UnboundedSender<LinkEvent>;

pub struct Link {
    writer: Box<dyn Write + Send>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
}

impl Link {
    pub fn new(writer: Box<dyn Write + Send>, events: mpsc::UnboundedReceiver<LinkEvent>) -> Self {
        Self { writer, events }
    }

    /// Create a link and the sender its read side should feed.
    pub fn channel(writer: Box<dyn Write + Send>) -> (Self, LinkEventSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(writer, rx), tx)
    }

    /// Write one configuration command.
    pub fn write_command(&mut self, command: Command) -> Result<(), LinkError> {
        let bytes = command.to_bytes();
        trace!("TX {command}: {bytes:02X?}");
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Wait for the next inbound event.
    ///
    /// A read side that goes away without saying anything is reported as a
    /// clean close.
    pub async fn next_event(&mut self) -> LinkEvent {
        self.events.recv().await.unwrap_or(LinkEvent::Closed)
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").finish_non_exhaustive()
    }
}

/// Opens links by address.
///
/// Implemented for serial ports by [`crate::serial::SerialOpener`]; tests
/// provide in-memory implementations.
pub trait LinkOpener: Send + Sync {
    fn open(&self, address: &str) -> Result<Link, LinkError>;
}
