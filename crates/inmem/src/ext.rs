use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::time::Duration;

use garoa_cache::{Cache, ExtendedCache, PrefixCache, PrefixExtendedCache};
use garoa_common::{CacheError, CacheResult};

use crate::base::CacheShared;
use crate::entry::{ExtItem, Value};
use crate::list::ValueList;

/// Backend em memória com listas, conjuntos e contadores além de strings.
pub struct InMemExtCache {
    shared: Arc<CacheShared<ExtItem>>,
}

impl InMemExtCache {
    /// Cria o cache e põe o janitor para rodar. Requer um runtime tokio.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shared: CacheShared::new(),
        })
    }

    /// Item-lista da chave, criado sob demanda.
    fn with_list<R>(&self, key: &str, f: impl FnOnce(&ValueList) -> R) -> CacheResult<R> {
        let (item, _) = self.shared.get_or_compute(key, || {
            Arc::new(ExtItem::new(Value::List(ValueList::default())))
        })?;
        match &*item.value() {
            Value::List(list) => Ok(f(list)),
            _ => Err(CacheError::WrongType),
        }
    }

    /// Item-conjunto da chave, criado sob demanda.
    fn with_set<R>(&self, key: &str, f: impl FnOnce(&DashSet<String>) -> R) -> CacheResult<R> {
        let (item, _) = self
            .shared
            .get_or_compute(key, || Arc::new(ExtItem::new(Value::Set(DashSet::new()))))?;
        match &*item.value() {
            Value::Set(set) => Ok(f(set)),
            _ => Err(CacheError::WrongType),
        }
    }
}

#[async_trait]
impl Cache for InMemExtCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let item = Arc::new(ExtItem::new(Value::Str(value.to_string())));
        self.shared.set_item(key, item, ttl).await
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        let item = self.shared.get_item(key)?;
        match &*item.value() {
            Value::Str(value) => Ok(value.clone()),
            Value::Counter(counter) => Ok(counter.load(Ordering::SeqCst).to_string()),
            _ => Err(CacheError::WrongType),
        }
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

#[async_trait]
impl ExtendedCache for InMemExtCache {
    async fn lpush(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.with_list(key, |list| list.push_front(values))
    }

    async fn rpush(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.with_list(key, |list| list.push_back(values))
    }

    async fn lpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        self.with_list(key, |list| list.pop_front(count))
    }

    async fn rpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        self.with_list(key, |list| list.pop_back(count))
    }

    async fn llen(&self, key: &str) -> CacheResult<usize> {
        self.with_list(key, |list| list.len())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>> {
        self.with_list(key, |list| list.range(start, stop))
    }

    async fn sadd(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.with_set(key, |set| {
            for value in values {
                set.insert(value.clone());
            }
        })
    }

    async fn srem(&self, key: &str, values: &[String]) -> CacheResult<()> {
        self.with_set(key, |set| {
            for value in values {
                set.remove(value);
            }
        })
    }

    async fn shas(&self, key: &str, value: &str) -> CacheResult<bool> {
        self.with_set(key, |set| set.contains(value))
    }

    async fn slen(&self, key: &str) -> CacheResult<usize> {
        self.with_set(key, |set| set.len())
    }

    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let (item, loaded) = self.shared.get_or_compute(key, || {
            Arc::new(ExtItem::new(Value::Counter(AtomicI64::new(delta))))
        })?;
        if !loaded {
            return Ok(delta);
        }
        loop {
            let current = item.value();
            match &*current {
                Value::Counter(counter) => {
                    return Ok(counter.fetch_add(delta, Ordering::SeqCst) + delta);
                }
                Value::Str(raw) => {
                    let parsed: i64 = raw.parse().map_err(|_| CacheError::WrongType)?;
                    let next = parsed + delta;
                    let new = Arc::new(Value::Counter(AtomicI64::new(next)));
                    if item.compare_and_swap(&current, new) {
                        return Ok(next);
                    }
                    // outra task trocou a variante no meio; tenta de novo
                }
                _ => return Err(CacheError::WrongType),
            }
        }
    }

    fn sub_extended_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn ExtendedCache> {
        Arc::new(PrefixExtendedCache::new(self, prefix))
    }
}
