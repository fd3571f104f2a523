//! Hand-built datx fixtures for integration tests

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::net::Ipv4Addr;
use tempfile::NamedTempFile;

pub const HEADER_SIZE: usize = 4;
pub const FIRST_LEVEL_INDEX_SIZE: usize = 256 * 1024;
pub const RECORD_SIZE: usize = 9;

/// Builds datx files from (range end, payload) pairs
#[derive(Default)]
pub struct Fixture {
    ranges: Vec<(Ipv4Addr, String)>,
    zero_first_level: bool,
    compact: bool,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range ending (inclusively) at `end`
    pub fn range(mut self, end: &str, payload: &str) -> Self {
        self.ranges.push((end.parse().unwrap(), payload.to_string()));
        self
    }

    /// Leave every first-level slot at record 0
    pub fn zero_first_level(mut self) -> Self {
        self.zero_first_level = true;
        self
    }

    /// Put payloads right after the records, with
    /// `total_offset = 4 + 262144 + records`
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    /// Serialize to datx bytes
    pub fn build(&self) -> Vec<u8> {
        let mut ranges = self.ranges.clone();
        ranges.sort_by_key(|(end, _)| u32::from(*end));

        let records_len = ranges.len() * RECORD_SIZE;
        let gap = if self.compact { 0 } else { FIRST_LEVEL_INDEX_SIZE };
        let total_offset = (HEADER_SIZE + FIRST_LEVEL_INDEX_SIZE + gap + records_len) as u32;

        let mut file = Vec::new();
        file.extend_from_slice(&total_offset.to_be_bytes());

        // first-level slot: first record whose end is at or above the prefix
        for slot in 0..(256 * 256u32) {
            let start = if self.zero_first_level {
                0
            } else {
                ranges
                    .iter()
                    .take_while(|(end, _)| u32::from(*end) < slot << 16)
                    .count() as u32
            };
            file.extend_from_slice(&start.to_le_bytes());
        }

        let mut payloads = Vec::new();
        for (end, payload) in &ranges {
            let offset = (FIRST_LEVEL_INDEX_SIZE + payloads.len()) as u32;
            file.extend_from_slice(&end.octets());
            file.extend_from_slice(&offset.to_le_bytes()[..3]);
            file.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            payloads.extend_from_slice(payload.as_bytes());
        }

        file.extend_from_slice(&vec![0u8; gap]);
        assert_eq!(file.len(), total_offset as usize);
        file.extend_from_slice(&payloads);
        file
    }

    /// Write to a temporary `.datx` file
    pub fn write(&self) -> NamedTempFile {
        write_bytes(&self.build(), ".datx")
    }

    /// Write a gzip-compressed copy to a temporary `.datx.gz` file
    pub fn write_gz(&self) -> NamedTempFile {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.build()).unwrap();
        write_bytes(&encoder.finish().unwrap(), ".datx.gz")
    }
}

pub fn write_bytes(data: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// A small China-style fixture spanning a few first-level buckets
pub fn sample() -> Fixture {
    Fixture::new()
        .range("0.255.255.255", "保留地址\t保留地址\t\t")
        .range("1.0.0.255", "澳大利亚\t澳大利亚\t\t")
        .range("1.0.3.255", "中国\t福建\t福州\t")
        .range("1.2.255.255", "中国\t广东\t广州\t")
        .range("8.8.8.7", "美国\t美国\t\t")
        .range("8.8.8.8", "GOOGLE.COM\tGOOGLE.COM\t\t")
        .range("114.114.114.114", "114DNS.COM\t114DNS.COM\t\t")
        .range("223.255.255.255", "中国\t北京\t北京\t")
}
