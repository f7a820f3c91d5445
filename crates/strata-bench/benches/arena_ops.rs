//! Criterion micro-benchmarks for arena allocation, release, reallocation
//! and introspection.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use strata_arena::{ArenaAllocator, ArenaConfig};
use strata_bench::{churn_trace, replay};

const ARENA_BYTES: u32 = 16 * 1024 * 1024;

fn make_arena() -> ArenaAllocator {
    ArenaAllocator::new(ArenaConfig::new(ARENA_BYTES).with_debug_tracking(false)).unwrap()
}

/// Benchmark: allocate then release one 1 KiB chunk in an empty arena.
fn bench_alloc_release(c: &mut Criterion) {
    let mut arena = make_arena();
    c.bench_function("alloc_release_1k", |b| {
        b.iter(|| {
            let ptr = arena.allocate(black_box(1024), 16, None).unwrap();
            arena.release(black_box(ptr)).unwrap();
        });
    });
}

/// Benchmark: first-fit walk past 1000 live chunks to reach free space.
fn bench_alloc_deep_walk(c: &mut Criterion) {
    let mut arena = make_arena();
    for _ in 0..1000 {
        arena.allocate(64, 8, None).unwrap();
    }
    c.bench_function("alloc_after_1000_live", |b| {
        b.iter(|| {
            let ptr = arena.allocate(black_box(256), 8, None).unwrap();
            arena.release(ptr).unwrap();
        });
    });
}

/// Benchmark: grow a decode buffer through five reallocations.
fn bench_realloc_growth(c: &mut Criterion) {
    let mut arena = make_arena();
    c.bench_function("realloc_growth_5x", |b| {
        b.iter(|| {
            let mut ptr = arena.allocate(256, 16, None).unwrap();
            for size in [1024, 4096, 16 * 1024, 64 * 1024, 256 * 1024] {
                ptr = arena.reallocate(ptr, size, 16, None).unwrap();
            }
            arena.release(black_box(ptr)).unwrap();
        });
    });
}

/// Benchmark: replay a 10K-op churn trace on a fresh arena.
fn bench_churn_trace(c: &mut Criterion) {
    let trace = churn_trace(42, 10_000);
    c.bench_function("churn_trace_10k", |b| {
        b.iter_batched(
            make_arena,
            |mut arena| black_box(replay(&mut arena, &trace).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: list every chunk of a fragmented arena.
fn bench_list_chunks(c: &mut Criterion) {
    let mut arena = make_arena();
    let ptrs: Vec<_> = (0..2000)
        .map(|_| arena.allocate(128, 8, None).unwrap())
        .collect();
    for ptr in ptrs.into_iter().step_by(2) {
        arena.release(ptr).unwrap();
    }
    c.bench_function("list_chunks_2000", |b| {
        b.iter(|| black_box(arena.list_chunks().unwrap().len()));
    });
}

criterion_group!(
    benches,
    bench_alloc_release,
    bench_alloc_deep_walk,
    bench_realloc_growth,
    bench_churn_trace,
    bench_list_chunks
);
criterion_main!(benches);
