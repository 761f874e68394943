//! Async wrappers for `FileCache` operations.
//!
//! Every cache operation is a blocking filesystem call. These methods move
//! them onto tokio's blocking pool so async callers don't stall the runtime.

use crate::cache::FileCache;
use crate::codec::PayloadCodec;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

impl<C> FileCache<C>
where
    C: PayloadCodec + Clone + 'static,
{
    /// Async version of `get_since` when `floor` is set, `get` otherwise.
    pub async fn get_async<T>(&self, key: String, floor: Option<DateTime<Utc>>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let cache = self.clone();
        let value = tokio::task::spawn_blocking(move || cache.lookup(&key, floor).ok()).await?;
        Ok(value)
    }

    /// Async version of `save`.
    pub async fn save_async<T>(&self, key: String, value: T) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.save(&key, &value)).await?
    }

    /// Async version of `save_with_ttl`.
    pub async fn save_with_ttl_async<T>(&self, key: String, value: T, ttl_secs: i64) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.save_with_ttl(&key, &value, ttl_secs)).await?
    }

    /// Async version of `delete`.
    pub async fn delete_async(&self, key: String) -> Result<()> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.delete(&key)).await?
    }

    /// Async version of `purge_expired`.
    pub async fn purge_expired_async(&self) -> Result<usize> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.purge_expired()).await?
    }
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfig, CacheError, FileCache};
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_async_save_get_delete() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(CacheConfig::new(dir.path()));

        cache
            .save_async("user/10".to_string(), vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let value: Option<Vec<String>> = cache
            .get_async("user/10".to_string(), None)
            .await
            .unwrap();
        assert_eq!(value, Some(vec!["a".to_string(), "b".to_string()]));

        cache.delete_async("user/10".to_string()).await.unwrap();

        let value: Option<Vec<String>> = cache
            .get_async("user/10".to_string(), None)
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_async_delete_missing() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(CacheConfig::new(dir.path()));

        let err = cache.delete_async("missing".to_string()).await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_async_freshness_floor() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(CacheConfig::new(dir.path()));

        cache
            .save_with_ttl_async("flag".to_string(), true, 0)
            .await
            .unwrap();

        let floor = Utc::now() + Duration::seconds(1);
        let value: Option<bool> = cache
            .get_async("flag".to_string(), Some(floor))
            .await
            .unwrap();
        assert!(value.is_none());
        assert_eq!(cache.purge_expired_async().await.unwrap(), 0);
    }
}
