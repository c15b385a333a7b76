use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;

/// 进程内缓存，TTL 在构建时统一设置
pub struct MokaCacheWrapper {
    inner: Cache<String, String>,
}

impl Default for MokaCacheWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl MokaCacheWrapper {
    pub fn new() -> Self {
        let config = AppConfig::get();
        Self::with_settings(
            config.cache.memory.max_capacity,
            Duration::from_secs(config.cache.default_ttl),
        )
    }

    pub fn with_settings(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        debug!(
            "MokaCacheWrapper initialized with max capacity: {}",
            max_capacity
        );
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(value) => {
                debug!("Cache hit: {}", key);
                CacheResult::Found(value)
            }
            None => {
                debug!("Cache miss: {}", key);
                CacheResult::NotFound
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, _ttl: u64) {
        // 单条 TTL 不生效，使用全局 TTL
        self.inner.insert(key, value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typed_roundtrip_and_remove() {
        let cache: Box<dyn ObjectCache> =
            Box::new(MokaCacheWrapper::with_settings(100, Duration::from_secs(60)));

        assert_eq!(cache.get::<i64>("student:1").await, CacheResult::NotFound);
        cache.insert("student:1", &42_i64).await;
        assert_eq!(cache.get::<i64>("student:1").await, CacheResult::Found(42));

        cache.remove("student:1").await;
        assert_eq!(cache.get::<i64>("student:1").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_undecodable_value() {
        let cache: Box<dyn ObjectCache> =
            Box::new(MokaCacheWrapper::with_settings(100, Duration::from_secs(60)));
        cache
            .insert_raw("k".to_string(), "not-a-number".to_string(), 0)
            .await;
        assert_eq!(cache.get::<i64>("k").await, CacheResult::ExistsButNoValue);
    }
}
