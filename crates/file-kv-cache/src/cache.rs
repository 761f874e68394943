//! File-backed key-value cache

use crate::codec::{decode_entry, encode_entry, JsonCodec, PayloadCodec};
use crate::error::{CacheError, Result};
use crate::router;
use crate::types::{CacheConfig, CacheStats, Miss, ShardPath};
use crate::writer::write_atomic;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A TTL cache storing one file per key under a sharded directory tree
#[derive(Clone)]
pub struct FileCache<C = JsonCodec> {
    config: Arc<CacheConfig>,
    codec: C,
    /// Cache hit counter
    hits: Arc<AtomicU64>,
    /// Cache miss counter
    misses: Arc<AtomicU64>,
    /// Successful saves
    writes: Arc<AtomicU64>,
    /// Entries removed because they were stale, expired or corrupt
    purged: Arc<AtomicU64>,
}

impl FileCache<JsonCodec> {
    /// Create a cache storing JSON payloads
    pub fn new(config: CacheConfig) -> Self {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: PayloadCodec> FileCache<C> {
    pub fn with_codec(config: CacheConfig, codec: C) -> Self {
        Self {
            config: Arc::new(config),
            codec,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            writes: Arc::new(AtomicU64::new(0)),
            purged: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Where the entry for `key` lives on disk
    pub fn path_for(&self, key: &str) -> ShardPath {
        router::path_for(&self.config.cache_dir, key)
    }

    /// Store a value using the configured default TTL
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.save_with_ttl(key, value, self.config.default_ttl_secs)
    }

    /// Store a value that expires `ttl_secs` from now, or never if `ttl_secs <= 0`
    pub fn save_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: i64,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let shard = self.path_for(key);
        let expires_at = if ttl_secs > 0 {
            Utc::now().timestamp().saturating_add(ttl_secs)
        } else {
            0
        };
        let payload = self.codec.encode(value)?;
        let bytes = encode_entry(expires_at, &payload);

        fs::create_dir_all(&shard.directory).map_err(|source| {
            warn!(
                key = %key,
                path = ?shard.directory,
                error = %source,
                "Failed to create shard directory"
            );
            CacheError::Write {
                path: shard.directory.clone(),
                source,
            }
        })?;

        write_atomic(&shard.file_path, &bytes).map_err(|source| {
            warn!(
                key = %key,
                path = ?shard.file_path,
                error = %source,
                "Failed to write cache entry"
            );
            CacheError::Write {
                path: shard.file_path.clone(),
                source,
            }
        })?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, expires_at, size = bytes.len(), "Cached entry");
        Ok(())
    }

    /// Fetch a value, ignoring file age
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key, None).ok()
    }

    /// Fetch a value, treating entries written before `floor` as stale
    pub fn get_since<T: DeserializeOwned>(&self, key: &str, floor: DateTime<Utc>) -> Option<T> {
        self.lookup(key, Some(floor)).ok()
    }

    /// Fetch a value and report why nothing was returned
    ///
    /// Stale, expired and unreadable entries are deleted on the way out.
    /// Deletion failures are logged and otherwise ignored.
    pub fn lookup<T: DeserializeOwned>(
        &self,
        key: &str,
        floor: Option<DateTime<Utc>>,
    ) -> std::result::Result<T, Miss> {
        let result = self.read_entry(key, floor);
        match &result {
            Ok(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit");
            }
            Err(reason) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, reason = %reason, "Cache miss");
            }
        }
        result
    }

    fn read_entry<T: DeserializeOwned>(
        &self,
        key: &str,
        floor: Option<DateTime<Utc>>,
    ) -> std::result::Result<T, Miss> {
        if key.is_empty() {
            return Err(Miss::NotFound);
        }

        let path = self.path_for(key).file_path;

        let metadata = fs::metadata(&path).map_err(|_| Miss::NotFound)?;
        if !metadata.is_file() {
            return Err(Miss::NotFound);
        }

        if let Some(floor) = floor {
            let modified = metadata.modified().map_err(|_| Miss::NotFound)?;
            if DateTime::<Utc>::from(modified) < floor {
                self.purge(&path, Miss::Stale);
                return Err(Miss::Stale);
            }
        }

        let bytes = fs::read(&path).map_err(|_| Miss::NotFound)?;

        let (expires_at, payload) = match decode_entry(&bytes) {
            Ok(parts) => parts,
            Err(reason) => {
                self.purge(&path, reason);
                return Err(reason);
            }
        };

        if is_expired(expires_at, Utc::now().timestamp()) {
            self.purge(&path, Miss::Expired);
            return Err(Miss::Expired);
        }

        self.codec.decode(payload).map_err(|e| {
            warn!(key = %key, path = ?path, error = %e, "Failed to decode cached payload");
            self.purge(&path, Miss::Deserialization);
            Miss::Deserialization
        })
    }

    /// Remove the entry for `key`
    pub fn delete(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let path = self.path_for(key).file_path;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = %key, "Deleted cache entry");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CacheError::NotFound(path)),
            Err(source) => Err(CacheError::Delete { path, source }),
        }
    }

    /// Walk the shard tree and delete expired or unreadable entries
    ///
    /// Returns the number of entry files removed. Temp files from in-flight
    /// writes and anything not named like an entry are left alone. Shard
    /// directories that cannot be listed are logged and skipped.
    pub fn purge_expired(&self) -> Result<usize> {
        let root = &self.config.cache_dir;
        if !root.is_dir() {
            return Ok(0);
        }

        let now = Utc::now().timestamp();
        let mut removed = 0;

        let mut shards = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                shards.push(path);
            }
        }

        for level_one in shards {
            for level_two in list_dir(&level_one) {
                if !level_two.is_dir() {
                    continue;
                }
                for path in list_dir(&level_two) {
                    if !path.is_file() || !router::is_entry_file(&path) {
                        continue;
                    }

                    // A concurrent delete may already have taken it
                    let Ok(bytes) = fs::read(&path) else {
                        continue;
                    };

                    let reason = match decode_entry(&bytes) {
                        Ok((expires_at, _)) if is_expired(expires_at, now) => Miss::Expired,
                        Ok(_) => continue,
                        Err(reason) => reason,
                    };

                    if self.purge(&path, reason) {
                        removed += 1;
                    }
                }
            }
        }

        info!(cache_dir = ?root, removed, "Swept expired cache entries");
        Ok(removed)
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }

    /// Best-effort removal of an entry that should no longer be served
    fn purge(&self, path: &Path, reason: Miss) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                self.purged.fetch_add(1, Ordering::Relaxed);
                debug!(path = ?path, reason = %reason, "Purged cache entry");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = ?path, reason = %reason, error = %e, "Failed to purge cache entry");
                false
            }
        }
    }
}

fn is_expired(expires_at: i64, now: i64) -> bool {
    expires_at != 0 && expires_at < now
}

/// Paths inside `dir`, or nothing if it cannot be listed
fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = ?dir, error = %e, "Skipping unreadable shard directory");
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(path = ?dir, error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .collect()
}
