//! Filesystem-backed key-value cache with TTL expiration
//!
//! Each key is hashed to a two-level shard directory and stored as a single
//! file holding an expiration header followed by the serialized value. Writes
//! go through a temp file and an atomic rename, so concurrent readers see
//! either the old entry or the new one. Reads treat missing, stale, expired
//! and corrupt entries alike as misses and delete the dead files.

mod async_ops;
mod cache;
pub mod codec;
pub mod error;
pub mod router;
mod types;
pub mod writer;

pub use cache::FileCache;
pub use codec::{JsonCodec, PayloadCodec};
pub use error::{CacheError, Result};
pub use types::{CacheConfig, CacheStats, Miss, ShardPath};
