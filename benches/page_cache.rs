use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use jobscroll::{
    domain::cursor::Cursor,
    infrastructure::memory::sample_listing,
    model::{
        page_cache::PageCache,
        window::{append_trimmed, prepend_trimmed},
    },
};

fn cache_churn(capacity: usize, keys: usize) -> usize {
    let mut cache = PageCache::new(capacity).unwrap();
    let mut hits = 0;
    for i in 0..keys {
        let key = Cursor::from_offset(i * 50);
        cache.set(key, i);
        // revisit a recent page like a user scrolling back a little
        if i >= 3 && cache.get(&Cursor::from_offset((i - 3) * 50)).is_some() {
            hits += 1;
        }
    }
    hits
}

fn benchmark(c: &mut Criterion) {
    c.bench_function("page-cache-churn", |b| {
        b.iter(|| cache_churn(black_box(20), black_box(1_000)))
    });

    let window: Vec<_> = (0..500).map(sample_listing).collect();
    let next: Vec<_> = (450..550).map(sample_listing).collect();
    let prev: Vec<_> = (0..50).map(|n| sample_listing(n + 10_000)).collect();

    c.bench_function("append-trimmed", |b| {
        b.iter(|| append_trimmed(black_box(window.clone()), black_box(next.clone()), 500))
    });

    c.bench_function("prepend-trimmed", |b| {
        b.iter(|| prepend_trimmed(black_box(window.clone()), black_box(prev.clone()), 500))
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
