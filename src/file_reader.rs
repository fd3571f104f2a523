//! Range reads and whole-file loading for datx database files
//!
//! Files ending in `.gz` (case-insensitive) are transparently decompressed.
//! Compressed files cannot be memory-mapped, so they are always loaded into
//! an owned buffer.
//!
//! # Example
//!
//! ```rust,no_run
//! use datx::file_reader::{self, LoadMode};
//!
//! // First four bytes: the big-endian total_offset header
//! let header = file_reader::read_range("ipip.datx", Some(4), 0)?;
//!
//! // Everything after the header
//! let storage = file_reader::load("ipip.datx", LoadMode::Mmap)?;
//! println!("{} bytes", storage.as_slice().len());
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Buffer size for streaming reads of compressed files
const BUFFER_SIZE: usize = 128 * 1024;

/// How a database file is brought into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Memory-map the file read-only (falls back to `Read` for `.gz` files)
    #[default]
    Mmap,
    /// Read the whole file into an owned buffer
    Read,
}

/// Storage for database bytes - either owned or memory-mapped
pub enum Storage {
    /// Heap buffer
    Owned(Vec<u8>),
    /// Read-only file mapping
    Mmap(Mmap),
}

impl Storage {
    /// The stored bytes
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Owned(v) => v.as_slice(),
            Storage::Mmap(m) => &m[..],
        }
    }

    /// True when the bytes are backed by a file mapping
    pub fn is_mapped(&self) -> bool {
        matches!(self, Storage::Mmap(_))
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("mapped", &self.is_mapped())
            .field("len", &self.as_slice().len())
            .finish()
    }
}

/// Check whether a path names a gzip-compressed file
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Read a byte range from a file
///
/// Reads exactly `length` bytes starting at `start`. With `length == None`
/// reads from `start` to end-of-file.
///
/// # Errors
///
/// Returns an error if:
/// - The file doesn't exist or permission is denied
/// - The file ends before `start + length` (`UnexpectedEof`)
/// - Invalid gzip data (for .gz files)
pub fn read_range<P: AsRef<Path>>(
    path: P,
    length: Option<usize>,
    start: u64,
) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip_path(path) {
        let mut decoder = BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file));
        let skipped = io::copy(&mut decoder.by_ref().take(start), &mut io::sink())?;
        if skipped < start {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "range start {} is past end of decompressed data ({} bytes)",
                    start, skipped
                ),
            ));
        }
        read_from(decoder, length)
    } else {
        let mut file = file;
        file.seek(SeekFrom::Start(start))?;
        read_from(file, length)
    }
}

fn read_from<R: Read>(mut reader: R, length: Option<usize>) -> io::Result<Vec<u8>> {
    match length {
        Some(len) => {
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Ok(buf)
        }
        None => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Load a whole database file
///
/// `.gz` files are decompressed into memory regardless of `mode`.
pub fn load<P: AsRef<Path>>(path: P, mode: LoadMode) -> io::Result<Storage> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip_path(path) {
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        tracing::debug!(path = %path.display(), len = buf.len(), "decompressed database");
        return Ok(Storage::Owned(buf));
    }

    let storage = match mode {
        LoadMode::Mmap => {
            // SAFETY: the mapping is read-only; database files are treated as
            // immutable for the lifetime of the process.
            let mmap = unsafe { Mmap::map(&file)? };
            Storage::Mmap(mmap)
        }
        LoadMode::Read => {
            let mut buf = Vec::new();
            let mut file = file;
            file.read_to_end(&mut buf)?;
            Storage::Owned(buf)
        }
    };
    tracing::debug!(
        path = %path.display(),
        len = storage.as_slice().len(),
        mapped = storage.is_mapped(),
        "loaded database"
    );
    Ok(storage)
}
