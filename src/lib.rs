//! datx - IPv4 Lookups over datx Index Files
//!
//! Resolves IPv4 addresses (or hostnames) to the text record stored for the
//! address range that contains them, reading an IPIP.net-style `.datx`
//! database. Files are read-only; nothing here builds or modifies them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use datx::Database;
//!
//! let db = Database::open("ipip.datx")?;
//!
//! if let Some(location) = db.find("1.2.3.4")? {
//!     println!("Found: {}", location);
//! }
//!
//! // IPv6 is not indexed by the format
//! assert!(db.find("2001:db8::1")?.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  datx File Format                    │
//! ├──────────────────────────────────────┤
//! │  1. total_offset header (u32 BE)     │
//! │  2. First-level index (64K slots)    │
//! │  3. Second-level index (9B records)  │
//! │  4. Payload strings                  │
//! └──────────────────────────────────────┘
//!          ↓ first lookup: mmap() or read
//! ┌──────────────────────────────────────┐
//! │  slot[a.b] → binary search → payload │
//! └──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified database API
pub mod database;
pub mod endian;
/// Error types for datx operations
pub mod error;
pub mod file_reader;
pub mod format;
pub mod resolver;
pub mod search;

pub use crate::database::{
    Database, DatabaseInfo, DatabaseOpener, DatabaseStatsSnapshot, RecordMatch,
};
pub use crate::error::DatxError;
pub use crate::file_reader::LoadMode;
pub use crate::resolver::{Resolver, SystemResolver};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
