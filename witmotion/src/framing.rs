//! Frame splitting for the WitMotion byte stream
//!
//! Datasets are delimited by the time sub-record marker. The splitter
//! accumulates bytes and yields each run that ends immediately before the
//! next marker, with the marker itself stripped. It does not inspect the
//! content of a run and imposes no length limit on it.

use bytes::{Bytes, BytesMut};

/// Two-byte marker that begins every dataset (sync byte + time record type).
pub const FRAME_MARKER: [u8; 2] = [0x55, 0x50];

/// Incremental splitter over an unbounded byte stream.
///
/// Bytes received before the first marker are discarded, since the run
/// they belong to started before the stream was opened. Empty runs (two
/// adjacent markers) are skipped.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buf: BytesMut,
    /// Index into `buf` from which the next marker search resumes
    scan_from: usize,
    synced: bool,
    discarded: usize,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            let pos = self.find_marker()?;
            let chunk = self.buf.split_to(pos).freeze();
            let _ = self.buf.split_to(FRAME_MARKER.len());
            self.scan_from = 0;

            if !self.synced {
                self.synced = true;
                self.discarded += chunk.len();
                continue;
            }
            if chunk.is_empty() {
                continue;
            }
            return Some(chunk);
        }
    }

    /// Push `data` and drain every frame it completes.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.push(data);
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Bytes buffered but not yet terminated by a marker.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Bytes dropped while waiting for the first marker.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Take the unterminated run at end of input, if the stream was synced.
    ///
    /// A live stream never ends, so this is only meaningful for captures.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scan_from = 0;
        if !self.synced || self.buf.is_empty() {
            self.discarded += self.buf.len();
            self.buf.clear();
            return None;
        }
        Some(self.buf.split().freeze())
    }

    /// Forget all buffered bytes and wait for a fresh marker.
    ///
    /// Used when the underlying link is reopened.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.scan_from = 0;
        self.synced = false;
    }

    fn find_marker(&mut self) -> Option<usize> {
        let found = self.buf[self.scan_from..]
            .windows(FRAME_MARKER.len())
            .position(|w| w == FRAME_MARKER)
            .map(|i| i + self.scan_from);

        if found.is_none() {
            // The last byte may be the first half of a marker
            self.scan_from = self.buf.len().saturating_sub(FRAME_MARKER.len() - 1);
        }
        found
    }
}
