//! Cache types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a file cache instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root under which shard directories and entry files are created
    pub cache_dir: PathBuf,
    /// TTL used by `FileCache::save`; zero or negative means never expires
    pub default_ttl_secs: i64,
}

impl CacheConfig {
    pub const DEFAULT_TTL_SECS: i64 = 3600;

    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from `CACHE_DIR` and `CACHE_TTL_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_dir = std::env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let default_ttl_secs = std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.default_ttl_secs);

        Self {
            cache_dir,
            default_ttl_secs,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("file-kv-cache"),
            default_ttl_secs: Self::DEFAULT_TTL_SECS,
        }
    }
}

/// Location of a key's entry file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPath {
    /// `<root>/<hex[0:2]>/<hex[2:4]>`
    pub directory: PathBuf,
    /// `<directory>/<hex>.cache`
    pub file_path: PathBuf,
}

/// Why a lookup produced no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// No entry file, or it could not be read
    NotFound,
    /// Entry was modified before the caller's freshness floor
    Stale,
    /// Entry's embedded expiration has passed
    Expired,
    /// Expiration header is missing or not an integer
    Malformed,
    /// Payload could not be turned back into a value
    Deserialization,
}

impl Miss {
    pub fn as_str(&self) -> &'static str {
        match self {
            Miss::NotFound => "not_found",
            Miss::Stale => "stale",
            Miss::Expired => "expired",
            Miss::Malformed => "malformed",
            Miss::Deserialization => "deserialization",
        }
    }
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub purged: u64,
}
