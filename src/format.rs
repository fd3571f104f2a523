//! datx Binary Format
//!
//! Fixed layout of an IPv4 datx database:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ 4 bytes        total_offset (u32, BE)        │
//! ├──────────────────────────────────────────────┤
//! │ 256 * 1024     first-level index             │  65,536 × u32 LE
//! │                (first two octets → record #) │
//! ├──────────────────────────────────────────────┤
//! │ n * 9          second-level index            │  sorted 9-byte records
//! ├──────────────────────────────────────────────┤
//! │ ...            payload strings               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! All positions below are relative to the *index buffer*: the file
//! contents starting right after the 4-byte header. The second-level index
//! ends at buffer position `total_offset - FIRST_LEVEL_INDEX_SIZE - HEADER_SIZE`
//! and a record's payload lives at
//! `total_offset + payload_offset - FIRST_LEVEL_INDEX_SIZE - HEADER_SIZE`.
//!
//! Second-level record layout:
//!
//! | bytes | field |
//! |-------|-------|
//! | 0..4  | range end (IPv4, network order, inclusive) |
//! | 4..7  | payload offset (24-bit LE) |
//! | 7..9  | payload length (u16 BE) |

use crate::endian::{read_bytes4, read_u16_be, read_u24_le, read_u32_be, read_u32_le};
use crate::error::{DatxError, Result};
use std::net::Ipv4Addr;

/// Size of the `total_offset` header
pub const HEADER_SIZE: usize = 4;

/// Number of first-level index slots (one per first-two-octet prefix)
pub const FIRST_LEVEL_SLOTS: usize = 256 * 256;

/// Size of the first-level index in bytes
pub const FIRST_LEVEL_INDEX_SIZE: usize = 256 * 1024;

/// Stride of a second-level index record
pub const RECORD_SIZE: usize = 9;

/// Decode the big-endian `total_offset` header
pub fn decode_total_offset(header: &[u8]) -> Result<u32> {
    read_u32_be(header, 0).ok_or_else(|| {
        DatxError::Io(format!(
            "file too small: {} bytes (need at least {})",
            header.len(),
            HEADER_SIZE
        ))
    })
}

/// A decoded second-level index record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Inclusive upper bound of the address range
    pub range_end: Ipv4Addr,
    /// Payload offset as stored in the record
    pub payload_offset: u32,
    /// Payload length in bytes
    pub payload_len: u16,
}

impl IndexRecord {
    /// Decode a record from its 9 raw bytes
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_SIZE {
            return None;
        }
        Some(IndexRecord {
            range_end: Ipv4Addr::from(read_bytes4(bytes, 0)?),
            payload_offset: read_u24_le(bytes, 4)?,
            payload_len: read_u16_be(bytes, 7)?,
        })
    }
}

/// Candidate records for one lookup
///
/// `start` and `end` are buffer positions; `end` is the end of the
/// second-level index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    /// Buffer position of the first candidate record
    pub start: usize,
    /// Buffer position where the second-level index ends
    pub end: usize,
}

impl SearchWindow {
    /// Number of whole records between `start` and `end`
    pub fn count(&self) -> usize {
        self.end.saturating_sub(self.start) / RECORD_SIZE
    }

    /// Buffer position of the `n`th candidate
    pub fn position(&self, n: usize) -> usize {
        self.start + n * RECORD_SIZE
    }
}

/// View over the index buffer (file contents after the header)
#[derive(Debug, Clone, Copy)]
pub struct IndexBuffer<'a> {
    data: &'a [u8],
    total_offset: u32,
}

impl<'a> IndexBuffer<'a> {
    /// Wrap an index buffer and its decoded `total_offset`
    pub fn new(data: &'a [u8], total_offset: u32) -> Self {
        Self { data, total_offset }
    }

    /// The header value this buffer was opened with
    pub fn total_offset(&self) -> u32 {
        self.total_offset
    }

    /// Raw buffer bytes
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Buffer position where the second-level index ends
    pub fn index_end(&self) -> usize {
        (self.total_offset as usize).saturating_sub(FIRST_LEVEL_INDEX_SIZE + HEADER_SIZE)
    }

    /// Total number of second-level records
    pub fn record_count(&self) -> usize {
        self.index_end().saturating_sub(FIRST_LEVEL_INDEX_SIZE) / RECORD_SIZE
    }

    /// First-level entry for a prefix: the record number where its bucket starts
    pub fn bucket_start(&self, first_octet: u8, second_octet: u8) -> Result<u32> {
        let slot = (first_octet as usize * 256 + second_octet as usize) * 4;
        read_u32_le(self.data, slot).ok_or_else(|| {
            DatxError::Format(format!(
                "first-level slot {}.{} at {} is past end of buffer ({} bytes)",
                first_octet,
                second_octet,
                slot,
                self.data.len()
            ))
        })
    }

    /// Candidate records starting at record number `start`
    pub fn window(&self, start: u32) -> SearchWindow {
        SearchWindow {
            start: start as usize * RECORD_SIZE + FIRST_LEVEL_INDEX_SIZE,
            end: self.index_end(),
        }
    }

    /// Range-end key of the record at a buffer position
    pub fn key_at(&self, pos: usize) -> Result<[u8; 4]> {
        read_bytes4(self.data, pos).ok_or_else(|| self.out_of_range("record key", pos, 4))
    }

    /// Decode the record at a buffer position
    pub fn record_at(&self, pos: usize) -> Result<IndexRecord> {
        self.data
            .get(pos..pos.saturating_add(RECORD_SIZE))
            .and_then(IndexRecord::decode)
            .ok_or_else(|| self.out_of_range("record", pos, RECORD_SIZE))
    }

    /// Payload bytes referenced by a record
    pub fn payload(&self, record: &IndexRecord) -> Result<&'a [u8]> {
        let len = record.payload_len as usize;
        let pos = (self.total_offset as usize + record.payload_offset as usize)
            .checked_sub(FIRST_LEVEL_INDEX_SIZE + HEADER_SIZE)
            .ok_or_else(|| {
                DatxError::Format(format!(
                    "payload offset {} underflows the index buffer",
                    record.payload_offset
                ))
            })?;
        self.data
            .get(pos..pos.saturating_add(len))
            .ok_or_else(|| self.out_of_range("payload", pos, len))
    }

    /// Number of first-level buckets that own at least one record
    ///
    /// A bucket owns a record when the record's range end carries its
    /// two-octet prefix. Counted from the sorted records themselves, so a
    /// zeroed or sparse first-level index does not skew it.
    pub fn populated_buckets(&self) -> usize {
        let window = self.window(0);
        let mut count = 0;
        let mut last_prefix = None;
        for n in 0..window.count() {
            let key = match self.key_at(window.position(n)) {
                Ok(key) => key,
                Err(_) => break,
            };
            let prefix = Some([key[0], key[1]]);
            if prefix != last_prefix {
                count += 1;
                last_prefix = prefix;
            }
        }
        count
    }

    fn out_of_range(&self, what: &str, pos: usize, len: usize) -> DatxError {
        DatxError::Format(format!(
            "{} at {}..{} is past end of buffer ({} bytes)",
            what,
            pos,
            pos.saturating_add(len),
            self.data.len()
        ))
    }
}
