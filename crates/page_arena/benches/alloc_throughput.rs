//! Benchmark: allocation and release throughput across payload shapes.
//!
//! One `bench_function` per workload size, with a short warm-up since each
//! iteration is cheap.

use criterion::{criterion_group, criterion_main, Criterion};
use page_arena::Pool;
use std::hint::black_box;
use std::time::Duration;

fn bench_small_bytes_1000(c: &mut Criterion) {
    let pool = Pool::new(256);
    c.bench_function("alloc_1000_small_byte_regions", |b| {
        b.iter(|| {
            let mut handle = pool.handle();
            for i in 0..1000u32 {
                let bytes = i.to_le_bytes();
                black_box(handle.alloc_bytes(&bytes));
            }
            handle.release();
        });
    });
}

fn bench_small_bytes_10000(c: &mut Criterion) {
    let pool = Pool::new(256);
    c.bench_function("alloc_10000_small_byte_regions", |b| {
        b.iter(|| {
            let mut handle = pool.handle();
            for i in 0..10000u32 {
                let bytes = i.to_le_bytes();
                black_box(handle.alloc_bytes(&bytes));
            }
            handle.release();
        });
    });
}

fn bench_strings_1000(c: &mut Criterion) {
    let pool = Pool::new(256);
    c.bench_function("alloc_1000_strings", |b| {
        b.iter(|| {
            let mut handle = pool.handle();
            for _ in 0..1000 {
                black_box(handle.alloc_str("a reasonably short request-scoped string"));
            }
            handle.release();
        });
    });
}

fn bench_numeric_slices_1000(c: &mut Criterion) {
    let pool = Pool::new(512);
    let data = [1i64, 2, 3, 4, 5, 6, 7, 8];
    c.bench_function("alloc_1000_numeric_slices", |b| {
        b.iter(|| {
            let mut handle = pool.handle();
            for _ in 0..1000 {
                black_box(handle.alloc_slice(&data));
            }
            handle.release();
        });
    });
}

fn bench_oversized_allocations_100(c: &mut Criterion) {
    let pool = Pool::new(64);
    let payload = vec![0xABu8; 4096];
    c.bench_function("alloc_100_oversized_regions", |b| {
        b.iter(|| {
            let mut handle = pool.handle();
            for _ in 0..100 {
                black_box(handle.alloc_bytes(&payload));
            }
            handle.release();
        });
    });
}

fn bench_chunk_reuse_across_handles(c: &mut Criterion) {
    let pool = Pool::new(256);
    c.bench_function("chunk_reuse_across_handles", |b| {
        b.iter(|| {
            for _ in 0..50 {
                let mut handle = pool.handle();
                for i in 0..64u32 {
                    black_box(handle.alloc_bytes(&i.to_le_bytes()));
                }
                handle.release();
            }
        });
    });
}

criterion_group!(
    name = alloc_throughput;
    config = Criterion::default()
        .sample_size(30)
        .warm_up_time(Duration::from_millis(200))
        .measurement_time(Duration::from_secs(2));
    targets =
        bench_small_bytes_1000,
        bench_small_bytes_10000,
        bench_strings_1000,
        bench_numeric_slices_1000,
        bench_oversized_allocations_100,
        bench_chunk_reuse_across_handles,
);

criterion_main!(alloc_throughput);
