use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use garoa_common::CacheResult;

/// Operações básicas de chave/valor com TTL.
///
/// `ttl` zero significa "sem expiração". Todos os backends devolvem os
/// mesmos erros sentinela (`CacheError::NotFound`, `CacheError::WrongType`).
#[async_trait]
pub trait Cache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
    async fn get(&self, key: &str) -> CacheResult<String>;
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// TTL restante da chave. Zero quando a chave não tem TTL.
    async fn get_ttl(&self, key: &str) -> CacheResult<Duration>;
    /// Define ou remove (ttl zero) a expiração de uma chave existente.
    async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()>;

    /// Encerra o backend. Idempotente; operações seguintes podem devolver
    /// `CacheError::Closed`.
    async fn close(&self) -> CacheResult<()>;

    /// Visão do mesmo backend com `prefix` acrescentado a toda chave.
    fn sub_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn Cache>;
}

/// Cache com operações de lista, conjunto e contador.
#[async_trait]
pub trait ExtendedCache: Cache {
    async fn lpush(&self, key: &str, values: &[String]) -> CacheResult<()>;
    async fn rpush(&self, key: &str, values: &[String]) -> CacheResult<()>;
    /// Remove e devolve até `count` valores do início da lista.
    async fn lpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>>;
    /// Remove e devolve até `count` valores do fim da lista.
    async fn rpop(&self, key: &str, count: usize) -> CacheResult<Vec<String>>;
    async fn llen(&self, key: &str) -> CacheResult<usize>;
    /// Intervalo inclusivo no estilo Redis: índices negativos contam do fim.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>>;

    async fn sadd(&self, key: &str, values: &[String]) -> CacheResult<()>;
    async fn srem(&self, key: &str, values: &[String]) -> CacheResult<()>;
    async fn shas(&self, key: &str, value: &str) -> CacheResult<bool>;
    async fn slen(&self, key: &str) -> CacheResult<usize>;

    /// Soma `delta` ao valor numérico da chave, criando-a se não existir.
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64>;

    fn sub_extended_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn ExtendedCache>;
}
