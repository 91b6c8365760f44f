use std::time::Duration;

use garoa_cache::{Cache, CacheError, ExtendedCache};
use garoa_inmem::{InMemCache, InMemExtCache};
use garoa_testutil as testutil;

/// Granularidade de TTL dos testes; folga suficiente para o janitor.
const GRAN: Duration = Duration::from_millis(150);

#[tokio::test]
async fn inmem_basic() {
    let cache = InMemCache::new();
    testutil::test_basic(cache.clone()).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn inmem_ttl() {
    let cache = InMemCache::new();
    testutil::test_ttl(cache.clone(), GRAN).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn inmem_ext_basic() {
    let cache = InMemExtCache::new();
    testutil::test_basic(cache.clone()).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn inmem_ext_ttl() {
    let cache = InMemExtCache::new();
    testutil::test_ttl(cache.clone(), GRAN).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn inmem_ext_lists() {
    let cache = InMemExtCache::new();
    testutil::test_lists(cache.clone()).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn inmem_ext_sets() {
    let cache = InMemExtCache::new();
    testutil::test_sets(cache.clone()).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn inmem_ext_incr() {
    let cache = InMemExtCache::new();
    testutil::test_incr(cache.clone()).await;
    cache.close().await.unwrap();
}

#[tokio::test]
async fn get_ttl_reports_remaining_time() {
    let cache = InMemCache::new();

    cache.set("key", "value", Duration::ZERO).await.unwrap();
    assert_eq!(cache.get_ttl("key").await.unwrap(), Duration::ZERO);

    // logo após o set a tag ainda pode estar pendente; get_ttl espera o
    // janitor resolver antes de responder
    cache
        .set("key", "value", Duration::from_millis(500))
        .await
        .unwrap();
    let remaining = cache.get_ttl("key").await.unwrap();
    assert!(remaining > Duration::ZERO);
    assert!(remaining <= Duration::from_millis(500));

    let err = cache.get_ttl("missing").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    cache.close().await.unwrap();
}

#[tokio::test]
async fn set_ttl_missing_key() {
    let cache = InMemCache::new();
    let err = cache.set_ttl("missing", GRAN).await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));
    cache.close().await.unwrap();
}

#[tokio::test]
async fn set_ttl_zero_removes_expiration() {
    let cache = InMemCache::new();
    cache.set("key", "value", GRAN).await.unwrap();

    cache.set_ttl("key", Duration::ZERO).await.unwrap();

    tokio::time::sleep(GRAN * 2).await;
    assert_eq!(cache.get("key").await.unwrap(), "value");
    assert_eq!(cache.get_ttl("key").await.unwrap(), Duration::ZERO);

    cache.close().await.unwrap();
}

#[tokio::test]
async fn set_ttl_reschedules_existing_expiration() {
    let cache = InMemCache::new();

    // alonga: a chave sobrevive ao TTL original
    cache.set("long", "value", GRAN).await.unwrap();
    cache.set_ttl("long", GRAN * 4).await.unwrap();
    tokio::time::sleep(GRAN * 2).await;
    assert_eq!(cache.get("long").await.unwrap(), "value");

    // encurta: a chave expira bem antes do TTL original
    cache.set("short", "value", GRAN * 10).await.unwrap();
    cache.set_ttl("short", GRAN).await.unwrap();
    tokio::time::sleep(GRAN * 2).await;
    let err = cache.get("short").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    // atribui TTL a uma chave que nunca teve um
    cache.set("fresh", "value", Duration::ZERO).await.unwrap();
    cache.set_ttl("fresh", GRAN).await.unwrap();
    tokio::time::sleep(GRAN * 2).await;
    let err = cache.get("fresh").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    cache.close().await.unwrap();
}

#[tokio::test]
async fn earlier_ttl_reschedules_timer() {
    let cache = InMemCache::new();
    cache
        .set("slow", "1", Duration::from_millis(400))
        .await
        .unwrap();
    cache
        .set("fast", "2", Duration::from_millis(80))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let err = cache.get("fast").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));
    assert_eq!(cache.get("slow").await.unwrap(), "1");

    cache.close().await.unwrap();
}

#[tokio::test]
async fn close_stops_accepting_writes() {
    let cache = InMemCache::new();
    cache.set("key", "value", Duration::ZERO).await.unwrap();

    cache.close().await.unwrap();
    // fechar de novo é inofensivo
    cache.close().await.unwrap();

    let err = cache.set("key", "value", GRAN).await.unwrap_err();
    assert!(matches!(err, CacheError::Closed));

    // o mapa foi esvaziado; leituras viram NotFound, del é no-op
    let err = cache.get("key").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));
    cache.del("key").await.unwrap();
}

#[tokio::test]
async fn close_stops_list_and_incr_ops() {
    let cache = InMemExtCache::new();
    cache.close().await.unwrap();

    let err = cache
        .lpush("list", &testutil::strs(&["a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Closed));
    let err = cache.incr("counter", 1).await.unwrap_err();
    assert!(matches!(err, CacheError::Closed));
}
