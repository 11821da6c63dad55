//! Checksum computation for WitMotion sub-records
//!
//! Every sub-record ends in a single checksum byte: the wrapping 8-bit sum
//! of the sync byte (`0x55`), the sub-record type byte, and the eight
//! payload bytes. The time sub-record at the start of a dataset has its
//! `55 50` marker stripped by the frame splitter, but its checksum still
//! covers those two bytes.

use bytemuck::{bytes_of, bytes_of_mut, Pod};

use crate::records::SYNC_BYTE;

/// Number of payload bytes covered by a sub-record checksum.
pub const PAYLOAD_LEN: usize = 8;

/// Trait for sub-record packets with a trailing 8-bit checksum.
///
/// The implementing type must be `Pod`, end with the checksum byte, and
/// have the eight payload bytes directly before it.
pub trait Checksummed: Pod {
    /// Sub-record type byte folded into the checksum.
    const KIND: u8;

    /// Payload bytes covered by the checksum (excluding sync and type).
    fn payload(&self) -> &[u8] {
        let bytes = bytes_of(self);
        let len = bytes.len();
        &bytes[len - 1 - PAYLOAD_LEN..len - 1]
    }

    /// The checksum byte stored in the packet.
    fn stored_checksum(&self) -> u8 {
        let bytes = bytes_of(self);
        bytes[bytes.len() - 1]
    }

    /// Compute what the checksum should be for this packet.
    fn compute_checksum(&self) -> u8 {
        compute_checksum(Self::KIND, self.payload())
    }

    /// Verify the stored checksum matches the computed value.
    fn verify_checksum(&self) -> bool {
        self.stored_checksum() == self.compute_checksum()
    }

    /// Compute and write the correct checksum to the packet.
    fn update_checksum(&mut self) {
        let checksum = self.compute_checksum();
        let bytes = bytes_of_mut(self);
        let len = bytes.len();
        bytes[len - 1] = checksum;
    }
}

/// Compute the checksum for a sub-record of type `kind` over `payload`.
pub fn compute_checksum(kind: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(SYNC_BYTE.wrapping_add(kind), |acc, &b| acc.wrapping_add(b))
}
