//! SPSC ring buffer push/pop throughput.

use criterion::Criterion;
use std::hint::black_box;
use treasury_mm_core::ring_buffer::SpscRingBuffer;

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpscRingBuffer");

    group.bench_function("push_pop_round_trip", |b| {
        let rb: SpscRingBuffer<u64, 1024> = SpscRingBuffer::new();
        let mut counter = 0u64;
        b.iter(|| {
            rb.try_push(black_box(counter));
            counter += 1;
            black_box(rb.try_pop());
        });
    });

    group.bench_function("batch_push_1000", |b| {
        let rb: SpscRingBuffer<u64, 2048> = SpscRingBuffer::new();
        b.iter_with_setup(
            || 0..1000u64,
            |mut items| {
                black_box(rb.try_push_batch(&mut items));
                let mut out = Vec::with_capacity(1000);
                rb.try_pop_batch(&mut out, 1000);
            },
        );
    });
}
