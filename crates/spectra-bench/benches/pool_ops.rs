//! Criterion micro-benchmarks for buffer pool checkout and return.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use spectra_arena::{AlignedArrayComplex, BufferPool, PoolConfig};

fn bench_pooled_hit(c: &mut Criterion) {
    let pool = BufferPool::new();
    drop(pool.request(1 << 20));
    c.bench_function("pool_request_release_hit_1mib", |b| {
        b.iter(|| {
            let buffer = pool.request(black_box(1 << 20));
            black_box(buffer.len());
        });
    });
}

fn bench_below_threshold(c: &mut Criterion) {
    let pool = BufferPool::new();
    c.bench_function("pool_request_release_small_4kib", |b| {
        b.iter(|| {
            let buffer = pool.request(black_box(4096));
            black_box(buffer.len());
        });
    });
}

fn bench_fresh_allocation(c: &mut Criterion) {
    let pool = BufferPool::with_config(PoolConfig {
        min_size_to_pool: usize::MAX,
        max_retained_bytes: 0,
    })
    .unwrap();
    c.bench_function("pool_request_release_unpooled_1mib", |b| {
        b.iter(|| {
            let buffer = pool.request(black_box(1 << 20));
            black_box(buffer.len());
        });
    });
}

fn bench_scratch_view(c: &mut Criterion) {
    let pool = BufferPool::new();
    c.bench_function("pooled_scratch_view_64k_complex", |b| {
        b.iter(|| {
            let view = AlignedArrayComplex::from_pool(&pool, 16, black_box(&[256usize, 256][..])).unwrap();
            black_box(view.buffer_len());
        });
    });
}

criterion_group!(
    benches,
    bench_pooled_hit,
    bench_below_threshold,
    bench_fresh_allocation,
    bench_scratch_view
);
criterion_main!(benches);
