//! Entity Cache
//!
//! Stores fetched [`EntityRecord`]s keyed by normalized identifier so each
//! entity is fetched from the network at most once per run (and, with the
//! disk store, across runs).
//!
//! Entries never expire: the data source is treated as static, so the first
//! successful fetch is authoritative.
//!
//! # Stores
//!
//! - [`MemoryEntityCache`] - process-lifetime map
//! - [`DiskEntityCache`] - one checksummed JSON file per identifier, fronted by
//!   an in-memory map
//! - [`NoOpCache`] - stores nothing
//!
//! A damaged disk entry is never an error for the caller: it is deleted,
//! counted in [`CacheStats::corrupt`], and reported as a miss so the client
//! re-fetches.
//!
//! # Example
//!
//! ```ignore
//! use oak::data::cache::{EntityCache, DiskEntityCache};
//! use std::sync::Arc;
//!
//! let cache: Arc<dyn EntityCache> = Arc::new(DiskEntityCache::open("data/cache")?);
//! let client = DataClient::new(config, cache, engine)?;
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{AppError, EntityRecord, Result};

// ============================================================================
// Cache Types
// ============================================================================

/// Statistics for cache monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses (including corrupt entries)
    pub misses: u64,
    /// Number of entries currently held
    pub entries: usize,
    /// Number of corrupt entries discarded
    pub corrupt: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Normalize an identifier into a cache key (trimmed, case-folded).
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ============================================================================
// Cache Trait
// ============================================================================

/// Keyed store of entity records.
///
/// Implementations must be safe to share across tasks; concurrent `put`s for
/// the same key resolve last-writer-wins.
pub trait EntityCache: Send + Sync {
    /// Get a record from the cache
    fn get(&self, key: &str) -> Option<EntityRecord>;

    /// Store a record
    fn put(&self, key: &str, record: &EntityRecord) -> Result<()>;

    /// Remove an entry
    fn invalidate(&self, key: &str) -> Result<()>;

    /// Remove every entry
    fn clear(&self) -> Result<()>;

    /// Get cache statistics
    fn stats(&self) -> CacheStats;

    /// Check if the cache is enabled
    fn is_enabled(&self) -> bool;
}

// ============================================================================
// Memory Cache
// ============================================================================

/// In-memory cache for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryEntityCache {
    entries: RwLock<HashMap<String, EntityRecord>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryEntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-seeded with records (keyed by their names).
    pub fn seeded(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|r| (normalize_key(&r.name), r))
            .collect();
        Self {
            entries: RwLock::new(entries),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl EntityCache for MemoryEntityCache {
    fn get(&self, key: &str) -> Option<EntityRecord> {
        let found = self.entries.read().get(&normalize_key(key)).cloned();
        match found {
            Some(record) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(record)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: &str, record: &EntityRecord) -> Result<()> {
        self.entries
            .write()
            .insert(normalize_key(key), record.clone());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        self.entries.write().remove(&normalize_key(key));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
            corrupt: 0,
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

// ============================================================================
// Disk Cache
// ============================================================================

const ENVELOPE_VERSION: u32 = 1;

/// On-disk entry format
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    key: String,
    /// Hex SHA-256 of the serialized record
    checksum: String,
    record: EntityRecord,
}

/// Which files in the cache directory belong to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreFile {
    Entry,
    Temp,
}

/// Classify `path` as an entry (`{sha256}.json`), a leftover temp file from
/// `put` (`{sha256}.tmp-{uuid}`), or neither.
fn store_file(path: &Path) -> Option<StoreFile> {
    let stem = path.file_stem()?.to_str()?;
    if stem.len() != 64 || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match path.extension()?.to_str()? {
        "json" => Some(StoreFile::Entry),
        ext if ext.starts_with("tmp-") => Some(StoreFile::Temp),
        _ => None,
    }
}

fn checksum(record: &EntityRecord) -> Result<String> {
    let body = serde_json::to_vec(record)
        .map_err(|e| AppError::Cache(format!("Failed to serialize record: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&body)))
}

/// Persisted store: `{dir}/{sha256(key)}.json`, one file per identifier.
///
/// Reads go through an in-memory map first; the directory is only consulted
/// on the first lookup of each key.
pub struct DiskEntityCache {
    dir: PathBuf,
    memory: RwLock<HashMap<String, EntityRecord>>,
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt: AtomicU64,
}

impl DiskEntityCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Cache(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            memory: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            corrupt: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(normalize_key(key).as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Read and verify one entry. `Ok(None)` means absent; `Err` means damaged.
    fn read_entry(&self, key: &str) -> std::result::Result<Option<EntityRecord>, String> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("unreadable: {}", e)),
        };

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| format!("unparsable: {}", e))?;

        if envelope.version != ENVELOPE_VERSION {
            return Err(format!("unsupported version {}", envelope.version));
        }
        if envelope.key != normalize_key(key) {
            return Err(format!("key mismatch ({})", envelope.key));
        }
        let actual = checksum(&envelope.record).map_err(|e| e.to_string())?;
        if actual != envelope.checksum {
            return Err("checksum mismatch".to_string());
        }

        Ok(Some(envelope.record))
    }

    fn count_disk_entries(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| store_file(&e.path()) == Some(StoreFile::Entry))
                    .count()
            })
            .unwrap_or(0)
    }
}

impl EntityCache for DiskEntityCache {
    fn get(&self, key: &str) -> Option<EntityRecord> {
        let key = normalize_key(key);

        if let Some(record) = self.memory.read().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(record);
        }

        match self.read_entry(&key) {
            Ok(Some(record)) => {
                self.memory.write().insert(key, record.clone());
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(record)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(reason) => {
                tracing::warn!(key = %key, reason = %reason, "Discarding corrupt cache entry");
                let _ = fs::remove_file(self.entry_path(&key));
                self.corrupt.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: &str, record: &EntityRecord) -> Result<()> {
        let key = normalize_key(key);
        let envelope = Envelope {
            version: ENVELOPE_VERSION,
            key: key.clone(),
            checksum: checksum(record)?,
            record: record.clone(),
        };
        let body = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| AppError::Cache(format!("Failed to serialize entry: {}", e)))?;

        // Write-then-rename: readers see the old entry or the new one, never a partial file
        let path = self.entry_path(&key);
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;

        self.memory.write().insert(key, record.clone());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        let key = normalize_key(key);
        self.memory.write().remove(&key);
        match fs::remove_file(self.entry_path(&key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        self.memory.write().clear();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && store_file(&path).is_some() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.count_disk_entries(),
            corrupt: self.corrupt.load(Ordering::Relaxed),
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

// ============================================================================
// No-Op Cache
// ============================================================================

/// A no-op cache that doesn't store anything
///
/// Useful for disabling caching without changing the code structure.
#[derive(Debug, Default)]
pub struct NoOpCache;

impl NoOpCache {
    /// Create a new no-op cache
    pub fn new() -> Self {
        Self
    }
}

impl EntityCache for NoOpCache {
    fn get(&self, _key: &str) -> Option<EntityRecord> {
        None
    }

    fn put(&self, _key: &str, _record: &EntityRecord) -> Result<()> {
        Ok(())
    }

    fn invalidate(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
