//! Two-stage IPv4 Index Search
//!
//! 1. The first two octets select a first-level slot, giving the record
//!    number where that prefix's bucket begins.
//! 2. A lower-bound binary search from there over the 9-byte records finds
//!    the first record whose range end is `>=` the address.
//!
//! Range ends are inclusive, so an address equal to a key resolves to that
//! key's record. A search ending exactly at the end of the second-level
//! index means the address is not covered.

use crate::error::Result;
use crate::format::{IndexBuffer, IndexRecord, FIRST_LEVEL_INDEX_SIZE, RECORD_SIZE};
use std::net::Ipv4Addr;

/// Result of a successful index search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupResult {
    /// Zero-based number of the matched second-level record
    pub record_number: usize,
    /// The matched record
    pub record: IndexRecord,
}

/// Search over an index buffer
pub struct SearchIndex<'a> {
    buffer: IndexBuffer<'a>,
}

impl<'a> SearchIndex<'a> {
    /// Create a search over a decoded index buffer
    pub fn new(buffer: IndexBuffer<'a>) -> Self {
        Self { buffer }
    }

    /// Find the record whose range covers `addr`
    pub fn lookup_v4(&self, addr: Ipv4Addr) -> Result<Option<LookupResult>> {
        let nip = addr.octets();
        let start = self.buffer.bucket_start(nip[0], nip[1])?;
        let window = self.buffer.window(start);

        let mut lo = 0usize;
        let mut hi = window.count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.buffer.key_at(window.position(mid))?;
            // Byte-wise comparison of network-order keys is numeric order
            if key < nip {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        let pos = window.position(lo);
        if pos == window.end {
            tracing::trace!(%addr, bucket_start = start, "address past last indexed range");
            return Ok(None);
        }

        // A bucket start at or past the index end searches nothing and falls
        // back to the record at that start, if the buffer holds one
        if pos.saturating_add(RECORD_SIZE) > self.buffer.as_slice().len() {
            tracing::trace!(%addr, bucket_start = start, "no record at bucket start");
            return Ok(None);
        }

        let record = self.buffer.record_at(pos)?;
        Ok(Some(LookupResult {
            record_number: (pos - FIRST_LEVEL_INDEX_SIZE) / RECORD_SIZE,
            record,
        }))
    }

    /// Payload bytes of a matched record
    pub fn payload(&self, result: &LookupResult) -> Result<&'a [u8]> {
        self.buffer.payload(&result.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HEADER_SIZE;

    /// Index buffer with the given sorted keys; every bucket starts at record 0
    /// and payload offsets are zero.
    fn buffer_with_keys(keys: &[[u8; 4]]) -> (Vec<u8>, u32) {
        let mut data = vec![0u8; FIRST_LEVEL_INDEX_SIZE];
        for key in keys {
            data.extend_from_slice(key);
            data.extend_from_slice(&[0, 0, 0, 0, 0]);
        }
        let total_offset = (HEADER_SIZE + 2 * FIRST_LEVEL_INDEX_SIZE + keys.len() * RECORD_SIZE) as u32;
        (data, total_offset)
    }

    fn found(keys: &[[u8; 4]], addr: [u8; 4]) -> Option<usize> {
        let (data, total_offset) = buffer_with_keys(keys);
        let search = SearchIndex::new(IndexBuffer::new(&data, total_offset));
        search
            .lookup_v4(Ipv4Addr::from(addr))
            .unwrap()
            .map(|r| r.record_number)
    }

    #[test]
    fn test_exact_key_is_inclusive() {
        let keys = [[1, 0, 0, 255], [1, 0, 1, 255], [2, 0, 0, 0]];
        assert_eq!(found(&keys, [1, 0, 0, 255]), Some(0));
        assert_eq!(found(&keys, [1, 0, 1, 255]), Some(1));
        assert_eq!(found(&keys, [2, 0, 0, 0]), Some(2));
    }

    #[test]
    fn test_between_keys_takes_upper_bound() {
        let keys = [[1, 0, 0, 255], [1, 0, 1, 255], [2, 0, 0, 0]];
        assert_eq!(found(&keys, [0, 0, 0, 0]), Some(0));
        assert_eq!(found(&keys, [1, 0, 1, 0]), Some(1));
        assert_eq!(found(&keys, [1, 200, 0, 0]), Some(2));
    }

    #[test]
    fn test_past_last_key() {
        let keys = [[1, 0, 0, 255], [2, 0, 0, 0]];
        assert_eq!(found(&keys, [2, 0, 0, 1]), None);
        assert_eq!(found(&keys, [255, 255, 255, 255]), None);
    }

    #[test]
    fn test_empty_index() {
        assert_eq!(found(&[], [0, 0, 0, 0]), None);
        assert_eq!(found(&[], [255, 255, 255, 255]), None);
    }

    /// Header value without the gap between records and payloads: the
    /// computed index end lands before the records
    fn compact_total_offset(records: usize) -> u32 {
        (HEADER_SIZE + FIRST_LEVEL_INDEX_SIZE + records * RECORD_SIZE) as u32
    }

    #[test]
    fn test_start_past_index_end_reads_record_at_start() {
        let (data, _) = buffer_with_keys(&[[10, 20, 30, 40]]);
        let search = SearchIndex::new(IndexBuffer::new(&data, compact_total_offset(1)));

        let result = search.lookup_v4(Ipv4Addr::new(10, 20, 0, 1)).unwrap().unwrap();
        assert_eq!(result.record_number, 0);
        assert_eq!(result.record.range_end, Ipv4Addr::new(10, 20, 30, 40));
    }

    #[test]
    fn test_start_past_index_end_without_record() {
        let (data, _) = buffer_with_keys(&[]);
        let search = SearchIndex::new(IndexBuffer::new(&data, compact_total_offset(0)));
        assert_eq!(search.lookup_v4(Ipv4Addr::UNSPECIFIED).unwrap(), None);
        assert_eq!(search.lookup_v4(Ipv4Addr::BROADCAST).unwrap(), None);
    }

    #[test]
    fn test_bucket_start_skips_earlier_records() {
        let keys = [[1, 0, 0, 255], [3, 3, 0, 255], [3, 3, 255, 255]];
        let (mut data, total_offset) = buffer_with_keys(&keys);
        // bucket 3.3 starts at record 1
        let slot = (3 * 256 + 3) * 4;
        data[slot..slot + 4].copy_from_slice(&1u32.to_le_bytes());

        let search = SearchIndex::new(IndexBuffer::new(&data, total_offset));
        let result = search.lookup_v4(Ipv4Addr::new(3, 3, 1, 0)).unwrap().unwrap();
        assert_eq!(result.record_number, 2);
        assert_eq!(result.record.range_end, Ipv4Addr::new(3, 3, 255, 255));
    }
}
