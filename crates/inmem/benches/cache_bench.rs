use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use garoa_cache::{Cache, ExtendedCache};
use garoa_inmem::InMemExtCache;

fn bench_set_get_sequential(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("set_get_sequential_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cache = InMemExtCache::new();
                for i in 0..10_000 {
                    let key = format!("key:{i}");
                    let value = format!("value:{i}");
                    cache.set(&key, &value, Duration::ZERO).await.unwrap();
                    black_box(cache.get(&key).await.unwrap());
                }
            });
        })
    });
}

fn bench_set_with_ttl(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("set_with_ttl_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cache = InMemExtCache::new();
                for i in 0..10_000 {
                    let key = format!("key:{i}");
                    cache
                        .set(&key, "value", Duration::from_secs(60))
                        .await
                        .unwrap();
                }
                cache.close().await.unwrap();
            });
        })
    });
}

fn bench_incr_concurrent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("incr_concurrent_4_tasks_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cache = InMemExtCache::new();
                let mut handles = Vec::new();

                for _ in 0..4 {
                    let cache = cache.clone();
                    handles.push(tokio::spawn(async move {
                        for _ in 0..2_500 {
                            black_box(cache.incr("counter", 1).await.unwrap());
                        }
                    }));
                }

                for h in handles {
                    h.await.unwrap();
                }
            });
        })
    });
}

fn bench_list_operations(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("rpush_lpop_1k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cache = InMemExtCache::new();
                for i in 0..1_000 {
                    cache
                        .rpush("list", &[format!("item:{i}")])
                        .await
                        .unwrap();
                }
                for _ in 0..1_000 {
                    black_box(cache.lpop("list", 1).await.unwrap());
                }
            });
        })
    });
}

criterion_group!(
    benches,
    bench_set_get_sequential,
    bench_set_with_ttl,
    bench_incr_concurrent,
    bench_list_operations,
);
criterion_main!(benches);
