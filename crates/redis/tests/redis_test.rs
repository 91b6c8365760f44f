use std::time::Duration;

use garoa_cache::Cache;
use garoa_redis::RedisCache;
use garoa_testutil as testutil;

fn redis_dsn() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into())
}

// A semântica de lpush multi-valor do Redis difere do backend em memória
// (o servidor empilha um a um), então test_lists fica de fora.

#[tokio::test]
#[ignore = "requer um servidor Redis acessível em REDIS_URL"]
async fn redis_basic() {
    let cache = RedisCache::connect(&redis_dsn()).await.unwrap();
    testutil::test_basic(cache.clone()).await;
}

#[tokio::test]
#[ignore = "requer um servidor Redis acessível em REDIS_URL"]
async fn redis_ttl() {
    let cache = RedisCache::connect(&redis_dsn()).await.unwrap();
    testutil::test_ttl(cache.clone(), Duration::from_millis(300)).await;
}

#[tokio::test]
#[ignore = "requer um servidor Redis acessível em REDIS_URL"]
async fn redis_sets_and_incr() {
    let cache = RedisCache::connect(&redis_dsn()).await.unwrap();
    cache.del("set").await.unwrap();
    cache.del("non-set").await.unwrap();
    cache.del("int").await.unwrap();
    cache.del("non-int").await.unwrap();
    cache.del("new").await.unwrap();

    testutil::test_sets(cache.clone()).await;
    testutil::test_incr(cache.clone()).await;
}
