#![forbid(unsafe_code)]

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use garoa_cache::{Cache, ExtendedCache, PrefixCache, PrefixExtendedCache};
use garoa_common::{CacheError, CacheResult};

/// Proxy para um servidor Redis remoto.
///
/// Cada operação vira o comando equivalente; os erros do servidor são
/// traduzidos para os sentinelas do contrato (resposta nula → `NotFound`,
/// `WRONGTYPE` → `WrongType`) e o resto passa adiante como erro de backend.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Conecta a partir de um DSN (`redis://host:porta/db`).
    pub async fn connect(dsn: &str) -> CacheResult<Arc<Self>> {
        let client = Client::open(dsn).map_err(translate)?;
        let conn = client.get_connection_manager().await.map_err(translate)?;
        Ok(Arc::new(Self { conn }))
    }

    /// Embrulha um gerenciador de conexão já existente.
    pub fn from_manager(conn: ConnectionManager) -> Arc<Self> {
        Arc::new(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn();
        let millis = ttl.as_millis() as u64;
        if millis == 0 {
            let _: () = conn.set(key, value).await.map_err(translate)?;
        } else {
            let _: () = conn.pset_ex(key, value, millis).await.map_err(translate)?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await.map_err(translate)?;
        value.ok_or(CacheError::NotFound)
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn();
        let _: () = conn.del(key).await.map_err(translate)?;
        Ok(())
    }

    async fn get_ttl(&self, key: &str) -> CacheResult<Duration> {
        let mut conn = self.conn();
        let millis: i64 = conn.pttl(key).await.map_err(translate)?;
        match millis {
            -2 => Err(CacheError::NotFound),
            millis if millis < 0 => Ok(Duration::ZERO),
            millis => Ok(Duration::from_millis(millis as u64)),
        }
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn();
        if ttl.is_zero() {
            let persisted: bool = conn.persist(key).await.map_err(translate)?;
            if !persisted {
                // PERSIST não distingue "sem TTL" de "sem chave"
                let exists: bool = conn.exists(key).await.map_err(translate)?;
                if !exists {
                    return Err(CacheError::NotFound);
                }
            }
            Ok(())
        } else {
            let ok: bool = conn
                .pexpire(key, ttl.as_millis() as i64)
                .await
                .map_err(translate)?;
            if !ok {
                return Err(CacheError::NotFound);
            }
            Ok(())
        }
    }

    async fn close(&self) -> CacheResult<()> {
        // a conexão é encerrada quando o último handle é dropado
        Ok(())
    }

    fn sub_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn Cache> {
        Arc::new(PrefixCache::new(self, prefix))
    }
}

#[async_trait]
impl ExtendedCache for RedisCache {
    async fn lpush(&self, key: &str, values: &[String]) -> CacheResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let _: () = conn.lpush(key, values).await.map_err(translate)?;
        Ok(())
    }

    async fn rpush(&self, key: &str, values: &[String]) -> CacheResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let _: () = conn.rpush(key, values).await.map_err(translate)?;
        Ok(())
    }

    async fn lpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        let Some(count) = NonZeroUsize::new(count) else {
            return Ok(Vec::new());
        };
        let mut conn = self.conn();
        let values: Vec<String> = conn.lpop(key, Some(count)).await.map_err(translate)?;
        Ok(values)
    }

    async fn rpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        let Some(count) = NonZeroUsize::new(count) else {
            return Ok(Vec::new());
        };
        let mut conn = self.conn();
        let values: Vec<String> = conn.rpop(key, Some(count)).await.map_err(translate)?;
        Ok(values)
    }

    async fn llen(&self, key: &str) -> CacheResult<usize> {
        let mut conn = self.conn();
        let len: i64 = conn.llen(key).await.map_err(translate)?;
        Ok(len as usize)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>> {
        let mut conn = self.conn();
        let values: Vec<String> = conn
            .lrange(key, start as isize, stop as isize)
            .await
            .map_err(translate)?;
        Ok(values)
    }

    async fn sadd(&self, key: &str, values: &[String]) -> CacheResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let _: () = conn.sadd(key, values).await.map_err(translate)?;
        Ok(())
    }

    async fn srem(&self, key: &str, values: &[String]) -> CacheResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let _: () = conn.srem(key, values).await.map_err(translate)?;
        Ok(())
    }

    async fn shas(&self, key: &str, value: &str) -> CacheResult<bool> {
        let mut conn = self.conn();
        let found: bool = conn.sismember(key, value).await.map_err(translate)?;
        Ok(found)
    }

    async fn slen(&self, key: &str) -> CacheResult<usize> {
        let mut conn = self.conn();
        let len: i64 = conn.scard(key).await.map_err(translate)?;
        Ok(len as usize)
    }

    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.conn();
        let value: i64 = conn.incr(key, delta).await.map_err(translate)?;
        Ok(value)
    }

    fn sub_extended_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn ExtendedCache> {
        Arc::new(PrefixExtendedCache::new(self, prefix))
    }
}

fn translate(err: redis::RedisError) -> CacheError {
    match err.code() {
        Some("WRONGTYPE") => CacheError::WrongType,
        _ => CacheError::Backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_dsn_is_backend_error() {
        let err = RedisCache::connect("not-a-redis-dsn").await.unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
    }
}
