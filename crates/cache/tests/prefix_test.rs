use std::time::Duration;

use garoa_cache::{Cache, CacheError, ExtendedCache};
use garoa_inmem::InMemExtCache;

#[tokio::test]
async fn prefix_hides_and_exposes_keys() {
    let cache = InMemExtCache::new();

    cache.set("a", "val_a", Duration::ZERO).await.unwrap();
    cache
        .set("prefix:b", "val_b", Duration::ZERO)
        .await
        .unwrap();

    let sub = cache.clone().sub_extended_cache("prefix:");

    // o sub-cache esconde chaves sem o prefixo
    let err = sub.get("a").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    // chave prefixada criada antes continua visível
    assert_eq!(sub.get("b").await.unwrap(), "val_b");

    // chave nova criada pelo sub-cache aparece prefixada no cache base
    sub.set("c", "val_c", Duration::ZERO).await.unwrap();
    let err = cache.get("c").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));
    assert_eq!(cache.get("prefix:c").await.unwrap(), "val_c");

    cache.close().await.unwrap();
}

#[tokio::test]
async fn prefix_passes_values_and_ttl_through() {
    let cache = InMemExtCache::new();
    let sub = cache.clone().sub_extended_cache("p:");

    sub.set("k", "v", Duration::from_millis(400)).await.unwrap();
    let remaining = cache.get_ttl("p:k").await.unwrap();
    assert!(remaining > Duration::ZERO);
    assert!(remaining <= Duration::from_millis(400));

    // operações estendidas delegam com a chave reescrita
    sub.rpush("list", &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    assert_eq!(
        cache.lrange("p:list", 0, -1).await.unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(sub.incr("n", 3).await.unwrap(), 3);
    assert_eq!(cache.get("p:n").await.unwrap(), "3");

    cache.close().await.unwrap();
}

#[tokio::test]
async fn prefixes_compose_by_concatenation() {
    let cache = InMemExtCache::new();
    let sub = cache.clone().sub_cache("p1:");
    let subsub = sub.sub_cache("p2:");

    subsub.set("k", "v", Duration::ZERO).await.unwrap();
    assert_eq!(cache.get("p1:p2:k").await.unwrap(), "v");
    assert_eq!(subsub.get("k").await.unwrap(), "v");

    cache.close().await.unwrap();
}
