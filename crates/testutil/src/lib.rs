#![forbid(unsafe_code)]

//! Suíte de conformidade compartilhada entre os backends.
//!
//! Cada função exercita um pedaço do contrato de [`Cache`] ou
//! [`ExtendedCache`] e entra em pânico na primeira divergência; os testes
//! de cada backend só escolhem granularidade de TTL e instanciam o cache.

use std::sync::Arc;
use std::time::Duration;

use garoa_cache::{Cache, ExtendedCache};
use garoa_common::CacheError;

/// Converte literais para o formato dos traits.
pub fn strs(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Set/get/sobrescrita e `NotFound` para chave ausente.
pub async fn test_basic(cache: Arc<dyn Cache>) {
    let err = cache.get("key").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    cache.set("key", "value1", Duration::ZERO).await.unwrap();
    cache.set("key", "value2", Duration::ZERO).await.unwrap();

    assert_eq!(cache.get("key").await.unwrap(), "value2");
}

/// Expiração, sobrescrita que limpa TTL e remoção antes de expirar.
pub async fn test_ttl(cache: Arc<dyn Cache>, gran: Duration) {
    // presente antes de expirar, ausente depois
    cache.set("key1", "value1", gran * 3).await.unwrap();
    cache.set("key2", "value2", gran).await.unwrap();

    assert_eq!(cache.get("key1").await.unwrap(), "value1");
    assert_eq!(cache.get("key2").await.unwrap(), "value2");

    tokio::time::sleep(gran * 2).await;

    assert_eq!(cache.get("key1").await.unwrap(), "value1");
    let err = cache.get("key2").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    tokio::time::sleep(gran * 2).await;

    let err = cache.get("key1").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));

    // sobrescrever com TTL zero faz o valor persistir
    cache.set("key2", "value2", gran).await.unwrap();
    cache.set("key2", "newvalue2", Duration::ZERO).await.unwrap();

    tokio::time::sleep(gran * 2).await;

    assert_eq!(cache.get("key2").await.unwrap(), "newvalue2");

    // o janitor não pode quebrar se a chave sumir antes de expirar
    cache.set("key3", "value3", gran).await.unwrap();
    cache.del("key3").await.unwrap();
    tokio::time::sleep(gran * 2).await;
    let err = cache.get("key3").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound));
}

/// Operações de lista, incluindo `WrongType` sobre chave que não é lista.
pub async fn test_lists(cache: Arc<dyn ExtendedCache>) {
    // monta a lista 1, 2, 3, 4, 5 usando lpush e rpush
    cache.lpush("list", &strs(&["3"])).await.unwrap();
    cache.lpush("list", &strs(&["1", "2"])).await.unwrap();
    cache.rpush("list", &strs(&["4", "5"])).await.unwrap();
    assert_eq!(cache.llen("list").await.unwrap(), 5);

    assert_eq!(
        cache.lrange("list", 0, -1).await.unwrap(),
        strs(&["1", "2", "3", "4", "5"])
    );
    assert_eq!(cache.lrange("list", -1, 99999).await.unwrap(), strs(&["5"]));
    assert_eq!(
        cache.lrange("list", 99999, -1).await.unwrap(),
        Vec::<String>::new()
    );

    assert_eq!(cache.lpop("list", 1).await.unwrap(), strs(&["1"]));
    assert_eq!(cache.rpop("list", 1).await.unwrap(), strs(&["5"]));
    assert_eq!(cache.rpop("list", 3).await.unwrap().len(), 3);
    assert_eq!(cache.rpop("list", 1).await.unwrap().len(), 0);

    // operações de lista numa chave que não é lista
    cache.set("non-list", "value", Duration::ZERO).await.unwrap();
    let err = cache.llen("non-list").await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));
    let err = cache.lpush("non-list", &strs(&["1"])).await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));
    let err = cache.lpop("non-list", 1).await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));
}

/// Operações de conjunto, incluindo `WrongType`.
pub async fn test_sets(cache: Arc<dyn ExtendedCache>) {
    // membros adicionados em etapas, duplicatas não contam
    cache.sadd("set", &strs(&["a", "b", "c"])).await.unwrap();
    cache.sadd("set", &strs(&["c", "d"])).await.unwrap();
    assert_eq!(cache.slen("set").await.unwrap(), 4);

    assert!(cache.shas("set", "b").await.unwrap());
    assert!(!cache.shas("set", "z").await.unwrap());

    cache.srem("set", &strs(&["a", "d"])).await.unwrap();
    assert_eq!(cache.slen("set").await.unwrap(), 2);

    // operações de conjunto numa chave que não é conjunto
    cache.set("non-set", "value", Duration::ZERO).await.unwrap();
    let err = cache.slen("non-set").await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));
    let err = cache.sadd("non-set", &strs(&["a"])).await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));
    let err = cache.srem("non-set", &strs(&["a"])).await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));
}

/// Contador: criação implícita, promoção de string e `WrongType`.
pub async fn test_incr(cache: Arc<dyn ExtendedCache>) {
    // string que não converte para inteiro falha com tipo errado
    cache.set("non-int", "a", Duration::ZERO).await.unwrap();
    let err = cache.incr("non-int", 1).await.unwrap_err();
    assert!(matches!(err, CacheError::WrongType));

    // string numérica é promovida a contador
    cache.set("int", "2", Duration::ZERO).await.unwrap();
    assert_eq!(cache.incr("int", 2).await.unwrap(), 4);
    assert_eq!(cache.incr("int", 1).await.unwrap(), 5);

    // a variante interna virou contador; get precisa continuar funcionando
    assert_eq!(cache.get("int").await.unwrap(), "5");

    // chave inexistente conta a partir de zero
    assert_eq!(cache.incr("new", 10).await.unwrap(), 10);
}
