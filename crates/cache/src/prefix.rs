use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use garoa_common::CacheResult;

use crate::{Cache, ExtendedCache};

/// Decorator que acrescenta um prefixo fixo a toda chave antes de delegar.
///
/// Valores e TTLs passam intactos. Prefixos se compõem por concatenação:
/// um sub-cache de um sub-cache enxerga `p1 + p2 + key`.
pub struct PrefixCache {
    inner: Arc<dyn Cache>,
    prefix: String,
}

impl PrefixCache {
    pub fn new(inner: Arc<dyn Cache>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: prefix.to_string(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl Cache for PrefixCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set(&self.full_key(key), value, ttl).await
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        self.inner.get(&self.full_key(key)).await
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.inner.del(&self.full_key(key)).await
    }

    async fn get_ttl(&self, key: &str) -> CacheResult<Duration> {
        self.inner.get_ttl(&self.full_key(key)).await
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set_ttl(&self.full_key(key), ttl).await
    }

    async fn close(&self) -> CacheResult<()> {
        self.inner.close().await
    }

    fn sub_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn Cache> {
        Arc::new(PrefixCache::new(self, prefix))
    }
}

/// Variante de `PrefixCache` sobre um backend estendido.
pub struct PrefixExtendedCache {
    inner: Arc<dyn ExtendedCache>,
    prefix: String,
}

impl PrefixExtendedCache {
    pub fn new(inner: Arc<dyn ExtendedCache>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: prefix.to_string(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl Cache for PrefixExtendedCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set(&self.full_key(key), value, ttl).await
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        self.inner.get(&self.full_key(key)).await
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.inner.del(&self.full_key(key)).await
    }

    async fn get_ttl(&self, key: &str) -> CacheResult<Duration> {
        self.inner.get_ttl(&self.full_key(key)).await
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set_ttl(&self.full_key(key), ttl).await
    }

    async fn close(&self) -> CacheResult<()> {
        self.inner.close().await
    }

    fn sub_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn Cache> {
        Arc::new(PrefixCache::new(self, prefix))
    }
}

#[async_trait]
impl ExtendedCache for PrefixExtendedCache {
    async fn lpush(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.inner.lpush(&self.full_key(key), values).await
    }

    async fn rpush(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.inner.rpush(&self.full_key(key), values).await
    }

    async fn lpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        self.inner.lpop(&self.full_key(key), count).await
    }

    async fn rpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        self.inner.rpop(&self.full_key(key), count).await
    }

    async fn llen(&self, key: &str) -> CacheResult<usize> {
        self.inner.llen(&self.full_key(key)).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>> {
        self.inner.lrange(&self.full_key(key), start, stop).await
    }

    async fn sadd(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.inner.sadd(&self.full_key(key), values).await
    }

    async fn srem(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.inner.srem(&self.full_key(key), values).await
    }

    async fn shas(&self, key: &str, value: &str) -> CacheResult<bool> {
        self.inner.shas(&self.full_key(key), value).await
    }

    async fn slen(&self, key: &str) -> CacheResult<usize> {
        self.inner.slen(&self.full_key(key)).await
    }

    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        self.inner.incr(&self.full_key(key), delta).await
    }

    fn sub_extended_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn ExtendedCache> {
        Arc::new(PrefixExtendedCache::new(self, prefix))
    }
}
