//! Database API
//!
//! [`Database`] answers "which record covers this address?" for a datx file.
//! Nothing is read at construction; the header and index buffer are loaded
//! on the first lookup and kept for the lifetime of the `Database`.
//!
//! Queries may be IPv4 literals or hostnames. Hostnames go through the
//! configured [`Resolver`]. Addresses that are not IPv4, and addresses past
//! the last indexed range, give `Ok(None)`.

use crate::error::{DatxError, Result};
use crate::file_reader::{self, LoadMode, Storage};
use crate::format::{decode_total_offset, IndexBuffer, HEADER_SIZE};
use crate::resolver::{Resolver, SystemResolver};
use crate::search::{LookupResult, SearchIndex};
use lru::LruCache;
use rustc_hash::FxHasher;
use serde::Serialize;
use std::hash::BuildHasherDefault;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Default LRU cache size for query results
pub const DEFAULT_QUERY_CACHE_SIZE: usize = 10_000;

type QueryCache = LruCache<u32, Option<RecordMatch>, BuildHasherDefault<FxHasher>>;

/// A matched index record and its decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordMatch {
    /// Payload decoded as UTF-8
    pub text: String,
    /// Inclusive upper bound of the matched range
    pub range_end: Ipv4Addr,
    /// Zero-based number of the matched second-level record
    pub record_number: usize,
}

impl RecordMatch {
    /// Payload split into its tab-separated fields
    ///
    /// IPIP payloads are typically `country\tregion\tcity\t...`.
    pub fn fields(&self) -> Vec<&str> {
        self.text.split('\t').collect()
    }
}

/// Statistics for database queries and cache performance
#[derive(Debug, Default)]
pub struct DatabaseStats {
    /// Total number of queries executed
    pub total_queries: AtomicU64,
    /// Queries that found a record
    pub queries_with_match: AtomicU64,
    /// IPv4 queries past every indexed range
    pub queries_without_match: AtomicU64,
    /// Queries whose address was not IPv4
    pub unsupported_family: AtomicU64,
    /// Queries that went through the resolver
    pub resolved_hostnames: AtomicU64,
    /// Cache hits (query served from cache)
    pub cache_hits: AtomicU64,
    /// Cache misses (query required lookup)
    pub cache_misses: AtomicU64,
}

/// Snapshot of database statistics at a point in time
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DatabaseStatsSnapshot {
    /// Total number of queries executed
    pub total_queries: u64,
    /// Queries that found a record
    pub queries_with_match: u64,
    /// IPv4 queries past every indexed range
    pub queries_without_match: u64,
    /// Queries whose address was not IPv4
    pub unsupported_family: u64,
    /// Queries that went through the resolver
    pub resolved_hostnames: u64,
    /// Cache hits (query served from cache)
    pub cache_hits: u64,
    /// Cache misses (query required lookup)
    pub cache_misses: u64,
}

impl DatabaseStats {
    /// Take a snapshot of current statistics
    pub fn snapshot(&self) -> DatabaseStatsSnapshot {
        DatabaseStatsSnapshot {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            queries_with_match: self.queries_with_match.load(Ordering::Relaxed),
            queries_without_match: self.queries_without_match.load(Ordering::Relaxed),
            unsupported_family: self.unsupported_family.load(Ordering::Relaxed),
            resolved_hostnames: self.resolved_hostnames.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl DatabaseStatsSnapshot {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let total_cache_ops = self.cache_hits + self.cache_misses;
        if total_cache_ops == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total_cache_ops as f64
        }
    }

    /// Calculate match rate (0.0 to 1.0)
    pub fn match_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.queries_with_match as f64 / self.total_queries as f64
        }
    }
}

/// Header and index facts about a database file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    /// Source path, if opened from a file
    pub path: Option<PathBuf>,
    /// Size of the (decompressed) file in bytes
    pub file_size: usize,
    /// Header value
    pub total_offset: u32,
    /// Number of second-level records
    pub record_count: usize,
    /// First-level buckets owning at least one record
    pub populated_buckets: usize,
    /// Bytes from `total_offset` to end of file
    pub payload_bytes: usize,
    /// Range end of the first record
    pub first_range_end: Option<Ipv4Addr>,
    /// Range end of the last record
    pub last_range_end: Option<Ipv4Addr>,
    /// Whether the file is memory-mapped
    pub mapped: bool,
}

/// Options for opening a database
#[derive(Clone)]
pub(crate) struct DatabaseOptions {
    /// Path to the database file
    pub path: PathBuf,
    /// LRU cache capacity (0 = disable)
    pub cache_capacity: usize,
    /// How the file is brought into memory
    pub load_mode: LoadMode,
    /// Load header and index at open instead of on first lookup
    pub eager: bool,
    /// Hostname resolver
    pub resolver: Arc<dyn Resolver>,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            cache_capacity: DEFAULT_QUERY_CACHE_SIZE,
            load_mode: LoadMode::default(),
            eager: false,
            resolver: Arc::new(SystemResolver),
        }
    }
}

/// Builder for opening databases with custom configuration
///
/// Created via `Database::from(path)`.
///
/// # Examples
///
/// ```no_run
/// use datx::{Database, LoadMode};
///
/// // Simple case with defaults
/// let db = Database::from("ipip.datx").open()?;
///
/// // Custom configuration
/// let db = Database::from("ipip.datx")
///     .cache_capacity(100_000)
///     .load_mode(LoadMode::Read)
///     .eager()
///     .open()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DatabaseOpener {
    options: DatabaseOptions,
}

impl DatabaseOpener {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            options: DatabaseOptions {
                path: path.into(),
                ..Default::default()
            },
        }
    }

    /// Set LRU cache capacity
    ///
    /// Default: 10,000 entries
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.options.cache_capacity = capacity;
        self
    }

    /// Disable caching entirely
    pub fn no_cache(mut self) -> Self {
        self.options.cache_capacity = 0;
        self
    }

    /// Choose between memory-mapping and reading the file
    pub fn load_mode(mut self, mode: LoadMode) -> Self {
        self.options.load_mode = mode;
        self
    }

    /// Load the header and index during `open()`
    ///
    /// Surfaces a missing or truncated file at open time rather than on the
    /// first lookup.
    pub fn eager(mut self) -> Self {
        self.options.eager = true;
        self
    }

    /// Use a custom hostname resolver
    pub fn resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.options.resolver = Arc::new(resolver);
        self
    }

    /// Open the database with configured options
    pub fn open(self) -> Result<Database> {
        Database::open_with_options(self.options)
    }
}

/// Header and index buffer, loaded once
struct LoadedIndex {
    storage: Storage,
    /// Offset of the index buffer within `storage`
    base: usize,
    total_offset: u32,
}

impl LoadedIndex {
    fn from_storage(storage: Storage) -> Result<Self> {
        let total_offset = decode_total_offset(storage.as_slice())?;
        Ok(Self {
            storage,
            base: HEADER_SIZE,
            total_offset,
        })
    }

    fn buffer(&self) -> IndexBuffer<'_> {
        IndexBuffer::new(&self.storage.as_slice()[self.base..], self.total_offset)
    }

    fn file_size(&self) -> usize {
        self.storage.as_slice().len() - self.base + HEADER_SIZE
    }
}

/// Read-only lookups over a datx database
///
/// This struct is Send + Sync and can be wrapped in Arc to share across
/// threads. Concurrent first lookups may each load the index; only one copy
/// is kept.
///
/// # Examples
///
/// ```no_run
/// use datx::Database;
///
/// let db = Database::open("ipip.datx")?;
///
/// if let Some(location) = db.find("8.8.8.8")? {
///     println!("8.8.8.8: {}", location);
/// }
///
/// // Hostnames are resolved first
/// let location = db.find("example.com")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Database {
    path: Option<PathBuf>,
    load_mode: LoadMode,
    index: OnceLock<LoadedIndex>,
    cache: Option<Mutex<QueryCache>>,
    resolver: Arc<dyn Resolver>,
    stats: DatabaseStats,
}

impl Database {
    /// Start configuring a database opened from `path`
    #[allow(clippy::should_implement_trait)]
    pub fn from(path: impl Into<PathBuf>) -> DatabaseOpener {
        DatabaseOpener::new(path)
    }

    /// Open a database file with default options
    ///
    /// The file is not touched until the first lookup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::from(path).open()
    }

    /// Create a database from raw file bytes (for testing)
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let loaded = LoadedIndex::from_storage(Storage::Owned(data))?;
        let index = OnceLock::new();
        let _ = index.set(loaded);
        Ok(Self {
            path: None,
            load_mode: LoadMode::Read,
            index,
            cache: None,
            resolver: Arc::new(SystemResolver),
            stats: DatabaseStats::default(),
        })
    }

    fn open_with_options(options: DatabaseOptions) -> Result<Self> {
        let cache = NonZeroUsize::new(options.cache_capacity)
            .map(|cap| Mutex::new(LruCache::with_hasher(cap, BuildHasherDefault::default())));

        let db = Self {
            path: Some(options.path),
            load_mode: options.load_mode,
            index: OnceLock::new(),
            cache,
            resolver: options.resolver,
            stats: DatabaseStats::default(),
        };

        if options.eager {
            db.index()?;
        }
        Ok(db)
    }

    /// Path the database was opened from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn index(&self) -> Result<&LoadedIndex> {
        // Fast path: already loaded
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        // Load outside the cell; a racing loader's copy is dropped
        let path = match &self.path {
            Some(p) => p,
            None => return Err(DatxError::Io("database has no backing file".to_string())),
        };
        let loaded = load_index(path, self.load_mode)?;
        tracing::debug!(
            path = %path.display(),
            total_offset = loaded.total_offset,
            records = loaded.buffer().record_count(),
            mapped = loaded.storage.is_mapped(),
            "datx index loaded"
        );
        Ok(self.index.get_or_init(|| loaded))
    }

    /// Header value: end of the index regions
    pub fn total_offset(&self) -> Result<u32> {
        Ok(self.index()?.total_offset)
    }

    /// The index buffer: file contents after the 4-byte header
    pub fn index_buffer(&self) -> Result<IndexBuffer<'_>> {
        Ok(self.index()?.buffer())
    }

    /// Look up an IPv4 address or hostname, returning the payload text
    ///
    /// Returns `Ok(None)` if the address is not IPv4 or lies past every
    /// indexed range. Resolution and I/O failures are errors.
    pub fn find(&self, query: &str) -> Result<Option<String>> {
        Ok(self.find_record(query)?.map(|m| m.text))
    }

    /// Like [`find`](Self::find), but split the payload on tabs
    pub fn find_fields(&self, query: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .find_record(query)?
            .map(|m| m.fields().into_iter().map(str::to_string).collect()))
    }

    /// Look up an IPv4 address or hostname, returning the matched record
    pub fn find_record(&self, query: &str) -> Result<Option<RecordMatch>> {
        let addr = self.resolve(query)?;
        self.lookup_ip(addr)
    }

    /// Parse `query` as an IP literal, or resolve it as a hostname
    pub fn resolve(&self, query: &str) -> Result<IpAddr> {
        let query = query.trim();

        // IP literals never reach the resolver
        if let Ok(addr) = query.parse::<IpAddr>() {
            return Ok(addr);
        }
        DatabaseStats::bump(&self.stats.resolved_hostnames);
        let addr = self.resolver.resolve(query).map_err(|e| DatxError::Resolve {
            host: query.to_string(),
            reason: e.to_string(),
        })?;
        tracing::trace!(host = query, %addr, "resolved hostname");
        Ok(addr)
    }

    /// Look up an IP address
    ///
    /// Only IPv4 is indexed; every other address family yields `Ok(None)`.
    pub fn lookup_ip(&self, addr: IpAddr) -> Result<Option<RecordMatch>> {
        match addr {
            IpAddr::V4(v4) => self.lookup_v4(v4),
            IpAddr::V6(_) => {
                DatabaseStats::bump(&self.stats.total_queries);
                DatabaseStats::bump(&self.stats.unsupported_family);
                Ok(None)
            }
        }
    }

    /// Look up an IPv4 address
    pub fn lookup_v4(&self, addr: Ipv4Addr) -> Result<Option<RecordMatch>> {
        DatabaseStats::bump(&self.stats.total_queries);
        let key = u32::from(addr);

        // Check cache first
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.get(&key) {
                DatabaseStats::bump(&self.stats.cache_hits);
                self.count_result(cached.is_some());
                return Ok(cached.clone());
            }
            DatabaseStats::bump(&self.stats.cache_misses);
        }

        // Cache miss: search the index
        let result = self.search_v4(addr)?;

        // Store misses as well as matches
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.put(key, result.clone());
        }
        self.count_result(result.is_some());
        Ok(result)
    }

    fn search_v4(&self, addr: Ipv4Addr) -> Result<Option<RecordMatch>> {
        let search = SearchIndex::new(self.index()?.buffer());
        let found: LookupResult = match search.lookup_v4(addr)? {
            Some(r) => r,
            None => return Ok(None),
        };
        // Payload follows the index regions, addressed relative to total_offset
        let payload = search.payload(&found)?;
        tracing::trace!(
            %addr,
            record = found.record_number,
            range_end = %found.record.range_end,
            len = payload.len(),
            "matched record"
        );
        Ok(Some(RecordMatch {
            text: String::from_utf8_lossy(payload).into_owned(),
            range_end: found.record.range_end,
            record_number: found.record_number,
        }))
    }

    fn count_result(&self, found: bool) {
        if found {
            DatabaseStats::bump(&self.stats.queries_with_match);
        } else {
            DatabaseStats::bump(&self.stats.queries_without_match);
        }
    }

    /// Header and index statistics
    pub fn info(&self) -> Result<DatabaseInfo> {
        let index = self.index()?;
        let buffer = index.buffer();
        let record_count = buffer.record_count();
        let range_end = |n: usize| -> Result<Option<Ipv4Addr>> {
            let window = buffer.window(0);
            if n >= window.count() {
                return Ok(None);
            }
            Ok(Some(Ipv4Addr::from(buffer.key_at(window.position(n))?)))
        };
        let file_size = index.file_size();

        Ok(DatabaseInfo {
            path: self.path.clone(),
            file_size,
            total_offset: index.total_offset,
            record_count,
            populated_buckets: buffer.populated_buckets(),
            payload_bytes: file_size.saturating_sub(index.total_offset as usize),
            first_range_end: range_end(0)?,
            last_range_end: match record_count {
                0 => None,
                n => range_end(n - 1)?,
            },
            mapped: index.storage.is_mapped(),
        })
    }

    /// Query statistics so far
    pub fn stats(&self) -> DatabaseStatsSnapshot {
        self.stats.snapshot()
    }

    /// Drop all cached query results
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("load_mode", &self.load_mode)
            .field("loaded", &self.index.get().is_some())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

/// Read header and index buffer from a file
fn load_index(path: &Path, mode: LoadMode) -> Result<LoadedIndex> {
    let io_err = |e: std::io::Error| DatxError::Io(format!("Failed to read {}: {}", path.display(), e));

    match mode {
        LoadMode::Mmap => LoadedIndex::from_storage(file_reader::load(path, mode).map_err(io_err)?),
        LoadMode::Read => {
            // Header and index buffer are read separately, the buffer to end of file
            let header = file_reader::read_range(path, Some(HEADER_SIZE), 0).map_err(io_err)?;
            let total_offset = decode_total_offset(&header)?;
            let buffer = file_reader::read_range(path, None, HEADER_SIZE as u64).map_err(io_err)?;
            Ok(LoadedIndex {
                storage: Storage::Owned(buffer),
                base: 0,
                total_offset,
            })
        }
    }
}
