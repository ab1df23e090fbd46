//! Per-project response cache store.
//!
//! One JSON file per entry under `<cache-dir>/llm_responses/{cache_key}.json`.
//! Expiry is lazy: entries are checked at read or sweep time, never by a
//! background timer. Corrupt files are evicted the moment a read trips over
//! them, so one bad record cannot poison future lookups.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::cache::entry::{now_secs, CacheEntry};
use crate::cache::key::{prompt_fingerprint, RequestParams};
use crate::error::Result;

/// Subdirectory holding one JSON file per cached response.
const RESPONSES_DIR: &str = "llm_responses";
/// Reserved for a future embedding cache; created but never written.
const EMBEDDINGS_DIR: &str = "embeddings";

/// Seconds per day, for the stats age fields.
const SECS_PER_DAY: f64 = 86_400.0;

/// Outcome of probing a single persisted entry without mutating it.
///
/// Exposed so callers (and tests) can tell an expired entry from a corrupt
/// one — the lazy read path collapses both into a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// No file exists for the key.
    Missing,
    /// Entry parses and its TTL has not elapsed.
    Active,
    /// Entry parses but its TTL has elapsed; the next read will evict it.
    Expired,
    /// The file exists but does not parse as a `CacheEntry`.
    Corrupt,
}

/// Result of loading an entry file from disk.
enum EntryLoad {
    Missing,
    Corrupt { reason: String },
    Loaded(CacheEntry),
}

/// Aggregate statistics for one project namespace.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: u64,
    pub expired_entries: u64,
    pub active_entries: u64,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub total_accesses: u64,
    pub avg_accesses_per_entry: f64,
    pub oldest_entry_age_days: f64,
    pub newest_entry_age_days: f64,
}

/// Durable per-project mapping from cache key to [`CacheEntry`].
///
/// All methods take `&self`; a single mutex serializes writes within the
/// namespace so interleaved writers can never produce a torn file. Entry
/// writes go through a temp-file-then-rename so a concurrent reader sees
/// either the old record or the new, never a partial one.
pub struct ResponseCache {
    project_id: String,
    responses_dir: PathBuf,
    default_ttl_secs: u64,
    io_lock: Mutex<()>,
}

impl ResponseCache {
    /// Open (creating if necessary) the cache namespace rooted at `cache_dir`.
    pub fn open(
        cache_dir: impl Into<PathBuf>,
        project_id: impl Into<String>,
        default_ttl_secs: u64,
    ) -> Result<Self> {
        let cache_dir = cache_dir.into();
        let responses_dir = cache_dir.join(RESPONSES_DIR);
        fs::create_dir_all(&responses_dir)?;
        fs::create_dir_all(cache_dir.join(EMBEDDINGS_DIR))?;
        Ok(Self {
            project_id: project_id.into(),
            responses_dir,
            default_ttl_secs,
            io_lock: Mutex::new(()),
        })
    }

    /// Project this namespace belongs to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Default TTL applied by [`set`](Self::set) when no override is given.
    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Look up a cached response. Returns `Ok(None)` on miss, on expiry
    /// (evicting the entry), and on corruption (evicting the file).
    ///
    /// A hit bumps `accessed_at`/`access_count` and persists the updated
    /// record; if that bookkeeping write fails the hit is still returned,
    /// since access-count accuracy is not a correctness property.
    pub fn get(&self, params: &RequestParams) -> Result<Option<Value>> {
        let key = params.cache_key();
        let path = self.entry_path(&key);
        let _guard = self.lock();

        match self.load_entry(&path)? {
            EntryLoad::Missing => Ok(None),
            EntryLoad::Corrupt { reason } => {
                warn!(key = %short(&key), %reason, "Evicting corrupt cache entry");
                remove_if_present(&path)?;
                Ok(None)
            }
            EntryLoad::Loaded(mut entry) => {
                let now = now_secs();
                if entry.is_expired_at(now) {
                    debug!(key = %short(&key), "Cache entry expired, removing");
                    remove_if_present(&path)?;
                    return Ok(None);
                }
                entry.touch(now);
                if let Err(e) = self.write_entry(&entry) {
                    warn!(key = %short(&key), error = %e, "Failed to persist access metadata");
                }
                Ok(Some(entry.response))
            }
        }
    }

    /// Store a response, overwriting any existing entry at the same key.
    ///
    /// `ttl_override` of `None` applies the namespace default TTL.
    /// Returns the cache key the entry was stored under.
    pub fn set(
        &self,
        params: &RequestParams,
        response: Value,
        ttl_override: Option<u64>,
    ) -> Result<String> {
        let key = params.cache_key();
        let now = now_secs();
        let entry = CacheEntry {
            response,
            cache_key: key.clone(),
            provider: params.provider.clone(),
            model: params.model.clone(),
            prompt_hash: prompt_fingerprint(&params.prompt),
            created_at: now,
            accessed_at: now,
            access_count: 1,
            ttl_seconds: Some(ttl_override.unwrap_or(self.default_ttl_secs)),
            request_metadata: params.metadata(),
        };

        let _guard = self.lock();
        self.write_entry(&entry)?;
        debug!(key = %short(&key), project = %self.project_id, "Stored response in cache");
        Ok(key)
    }

    /// Delete the entry for an exact key. Returns whether a file was removed.
    ///
    /// Keys are always hex digests; anything else can never name an entry
    /// and is rejected without touching the filesystem.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(false);
        }
        let _guard = self.lock();
        remove_if_present(&self.entry_path(key))
    }

    /// Delete every entry in the namespace. Returns the number removed.
    pub fn clear_all(&self) -> Result<u64> {
        let _guard = self.lock();
        let mut count = 0;
        for path in self.entry_files()? {
            if remove_if_present(&path)? {
                count += 1;
            }
        }
        debug!(project = %self.project_id, count, "Cleared all cache entries");
        Ok(count)
    }

    /// Delete every expired or unparsable entry. Returns the number removed.
    pub fn clear_expired(&self) -> Result<u64> {
        let _guard = self.lock();
        let now = now_secs();
        let mut count = 0;
        for path in self.entry_files()? {
            let evict = match self.load_entry(&path)? {
                EntryLoad::Missing => false,
                EntryLoad::Corrupt { reason } => {
                    warn!(path = %path.display(), %reason, "Sweeping corrupt cache entry");
                    true
                }
                EntryLoad::Loaded(entry) => entry.is_expired_at(now),
            };
            if evict && remove_if_present(&path)? {
                count += 1;
            }
        }
        debug!(project = %self.project_id, count, "Swept expired cache entries");
        Ok(count)
    }

    /// Scan the namespace and report aggregate statistics.
    ///
    /// Unparsable files contribute their size but nothing else; an empty
    /// namespace reports zero averages.
    pub fn stats(&self) -> Result<CacheStats> {
        let _guard = self.lock();
        let now = now_secs();

        let mut total_entries: u64 = 0;
        let mut expired_entries: u64 = 0;
        let mut total_size_bytes: u64 = 0;
        let mut total_accesses: u64 = 0;
        let mut oldest: Option<u64> = None;
        let mut newest: Option<u64> = None;

        for path in self.entry_files()? {
            if let Ok(meta) = fs::metadata(&path) {
                total_size_bytes += meta.len();
            }
            let entry = match self.load_entry(&path)? {
                EntryLoad::Loaded(entry) => entry,
                _ => continue,
            };
            total_entries += 1;
            total_accesses += entry.access_count;
            if entry.is_expired_at(now) {
                expired_entries += 1;
            }
            oldest = Some(oldest.map_or(entry.created_at, |t| t.min(entry.created_at)));
            newest = Some(newest.map_or(entry.created_at, |t| t.max(entry.created_at)));
        }

        let avg = if total_entries > 0 {
            total_accesses as f64 / total_entries as f64
        } else {
            0.0
        };
        let age_days =
            |created: Option<u64>| created.map_or(0.0, |t| now.saturating_sub(t) as f64 / SECS_PER_DAY);

        Ok(CacheStats {
            total_entries,
            expired_entries,
            active_entries: total_entries - expired_entries,
            total_size_bytes,
            total_size_mb: round2(total_size_bytes as f64 / (1024.0 * 1024.0)),
            total_accesses,
            avg_accesses_per_entry: round2(avg),
            oldest_entry_age_days: round1(age_days(oldest)),
            newest_entry_age_days: round1(age_days(newest)),
        })
    }

    /// Probe a single key without mutating anything.
    pub fn inspect(&self, key: &str) -> Result<EntryStatus> {
        let _guard = self.lock();
        match self.load_entry(&self.entry_path(key))? {
            EntryLoad::Missing => Ok(EntryStatus::Missing),
            EntryLoad::Corrupt { .. } => Ok(EntryStatus::Corrupt),
            EntryLoad::Loaded(entry) => {
                if entry.is_expired() {
                    Ok(EntryStatus::Expired)
                } else {
                    Ok(EntryStatus::Active)
                }
            }
        }
    }

    // -- private helpers ---------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned lock only means another writer panicked mid-operation;
        // the temp-file protocol keeps on-disk state consistent regardless.
        self.io_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.responses_dir.join(format!("{key}.json"))
    }

    /// All `*.json` files currently in the responses directory.
    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dirent in fs::read_dir(&self.responses_dir)? {
            let path = dirent?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn load_entry(&self, path: &Path) -> Result<EntryLoad> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EntryLoad::Missing),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<CacheEntry>(&data) {
            Ok(entry) => Ok(EntryLoad::Loaded(entry)),
            Err(e) => Ok(EntryLoad::Corrupt {
                reason: e.to_string(),
            }),
        }
    }

    /// Atomically persist an entry: write to a temp file in the same
    /// directory, then rename over the target.
    fn write_entry(&self, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(&entry.cache_key);
        let data = serde_json::to_string_pretty(entry)?;
        let mut tmp = NamedTempFile::new_in(&self.responses_dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Remove a file, treating "already gone" as a successful no-op.
fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// First eight chars of a key, for log lines.
fn short(key: &str) -> &str {
    &key[..8.min(key.len())]
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
