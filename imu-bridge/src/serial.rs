//! Serial port links.
//!
//! The port is opened with a short read timeout and cloned; the clone is
//! read on a dedicated thread that forwards traffic into the link's event
//! channel. The thread exits once the link is dropped.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::Bytes;
use serialport::SerialPort;
use tracing::{debug, trace};

use crate::link::{Link, LinkError, LinkEvent, LinkEventSender, LinkOpener};

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const READ_BUFFER_SIZE: usize = 1024;

pub struct SerialOpener {
    baud_rate: u32,
}

impl SerialOpener {
    pub fn new(baud_rate: u32) -> Self {
        Self { baud_rate }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl LinkOpener for SerialOpener {
    fn open(&self, address: &str) -> Result<Link, LinkError> {
        let open_failed = |e: &dyn std::fmt::Display| LinkError::OpenFailed {
            address: address.to_string(),
            reason: e.to_string(),
        };

        debug!("Opening {address} at {} baud", self.baud_rate);
        let port = serialport::new(address, self.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| open_failed(&e))?;
        let reader = port.try_clone().map_err(|e| open_failed(&e))?;

        let (link, tx) = Link::channel(Box::new(port));
        let name = address.to_string();
        std::thread::Builder::new()
            .name(format!("serial-rx {address}"))
            .spawn(move || read_loop(reader, tx, &name))
            .map_err(|e| open_failed(&e))?;

        Ok(link)
    }
}

fn read_loop(mut port: Box<dyn SerialPort>, tx: LinkEventSender, address: &str) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    while !tx.is_closed() {
        match port.read(&mut buf) {
            Ok(0) => {
                let _ = tx.send(LinkEvent::Closed);
                break;
            }
            Ok(n) => {
                trace!("RX {n} bytes from {address}");
                if tx.send(LinkEvent::Data(Bytes::copy_from_slice(&buf[..n]))).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
            Err(e) => {
                let _ = tx.send(LinkEvent::Error(e));
                break;
            }
        }
    }
    debug!("Reader for {address} stopped");
}
