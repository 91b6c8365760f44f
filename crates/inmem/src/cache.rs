use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Duration;

use garoa_cache::{Cache, PrefixCache};
use garoa_common::CacheResult;

use crate::base::CacheShared;
use crate::entry::StrItem;

/// Backend em memória com valores string puros.
///
/// Mais barato que [`crate::InMemExtCache`] quando só chave/valor e TTL
/// importam.
pub struct InMemCache {
    shared: Arc<CacheShared<StrItem>>,
}

impl InMemCache {
    /// Cria o cache e põe o janitor para rodar. Requer um runtime tokio.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shared: CacheShared::new(),
        })
    }
}

#[async_trait]
impl Cache for InMemCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.shared
            .set_item(key, Arc::new(StrItem::new(value)), ttl)
            .await
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        Ok(self.shared.get_item(key)?.value().to_string())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.shared.del(key);
        Ok(())
    }

    async fn get_ttl(&self, key: &str) -> CacheResult<Duration> {
        self.shared.get_ttl(key).await
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        self.shared.set_ttl(key, ttl).await
    }

    async fn close(&self) -> CacheResult<()> {
        self.shared.close();
        Ok(())
    }

    fn sub_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn Cache> {
        Arc::new(PrefixCache::new(self, prefix))
    }
}
