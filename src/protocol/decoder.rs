// src/protocol/decoder.rs

//! Splits a byte stream into length-delimited records.
//!
//! Two front ends share the same framing rule:
//! - [`decode_at`] / [`Records`] work on a complete in-memory slice.
//! - [`StreamDecoder`] accepts bytes in arbitrary chunks (pipes, sockets) and
//!   hands out a record only once its whole payload has arrived.
//!
//! Running out of bytes, even in the middle of a record, is a normal end of
//! input. The decoder never fails.

use super::HEADER_LEN;
use log::{trace, warn};

/// One framed command borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub opcode: u8,
    /// Exactly `length` bytes, as declared by the length byte.
    pub payload: &'a [u8],
}

impl Record<'_> {
    /// The declared payload length.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Total bytes this record occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }
}

/// A record that owns its payload, produced by [`StreamDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRecord {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl OwnedRecord {
    pub fn as_record(&self) -> Record<'_> {
        Record {
            opcode: self.opcode,
            payload: &self.payload,
        }
    }
}

/// Result of decoding at one offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// A complete record and the offset of the byte following it.
    Record(Record<'a>, usize),
    /// No bytes remain.
    Exhausted,
    /// Some bytes remain but not a whole record; `remaining` of them.
    Truncated { remaining: usize },
}

/// Decodes the record starting at `offset`.
///
/// Needs two header bytes plus `length` payload bytes. Pure function of its
/// inputs; an offset past the end counts as exhausted.
pub fn decode_at(bytes: &[u8], offset: usize) -> Decoded<'_> {
    let rest = bytes.get(offset..).unwrap_or_default();
    if rest.is_empty() {
        return Decoded::Exhausted;
    }
    if rest.len() < HEADER_LEN {
        return Decoded::Truncated {
            remaining: rest.len(),
        };
    }
    let opcode = rest[0];
    let length = rest[1] as usize;
    let end = HEADER_LEN + length;
    if rest.len() < end {
        return Decoded::Truncated {
            remaining: rest.len(),
        };
    }
    let record = Record {
        opcode,
        payload: &rest[HEADER_LEN..end],
    };
    Decoded::Record(record, offset + end)
}

/// Iterates over the records of a complete byte slice.
pub fn records(bytes: &[u8]) -> Records<'_> {
    Records {
        bytes,
        offset: 0,
        trailing: 0,
    }
}

/// Lazy iterator of records. Stops at exhaustion or truncation.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    bytes: &'a [u8],
    offset: usize,
    trailing: usize,
}

impl<'a> Records<'a> {
    /// Offset of the next undecoded byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left over from an incomplete final record (0 if none, or if
    /// iteration has not reached the end yet).
    pub fn trailing(&self) -> usize {
        self.trailing
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match decode_at(self.bytes, self.offset) {
            Decoded::Record(record, next) => {
                trace!(
                    "decoder: opcode 0x{:02X} len {} at offset {}",
                    record.opcode,
                    record.len(),
                    self.offset
                );
                self.offset = next;
                Some(record)
            }
            Decoded::Exhausted => None,
            Decoded::Truncated { remaining } => {
                if self.trailing == 0 {
                    warn!(
                        "decoder: stream truncated, {} byte(s) of an incomplete record \
                         at offset {}",
                        remaining,
                        self.offset
                    );
                }
                self.trailing = remaining;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Records<'_> {}

/// Incremental decoder for byte sources that deliver data in pieces.
///
/// Bytes are appended with [`StreamDecoder::push`]; complete records are
/// taken with [`StreamDecoder::next_record`]. Whatever is still pending when
/// the source ends is an incomplete record and is discarded by the caller.
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    consumed: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        StreamDecoder::default()
    }

    /// Appends freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.compact();
        self.pending.extend_from_slice(bytes);
    }

    /// Takes the next complete record, if one is buffered.
    pub fn next_record(&mut self) -> Option<OwnedRecord> {
        match decode_at(&self.pending, self.consumed) {
            Decoded::Record(record, next) => {
                let owned = OwnedRecord {
                    opcode: record.opcode,
                    payload: record.payload.to_vec(),
                };
                self.consumed = next;
                Some(owned)
            }
            Decoded::Exhausted | Decoded::Truncated { .. } => None,
        }
    }

    /// Number of buffered bytes not yet returned as part of a record.
    pub fn pending_len(&self) -> usize {
        self.pending.len() - self.consumed
    }

    // Drops bytes that have already been handed out.
    fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        self.pending.drain(..self.consumed);
        self.consumed = 0;
    }
}
