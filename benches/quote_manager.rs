//! Two-sided quote placement and replacement latency.

use criterion::Criterion;
use std::hint::black_box;
use treasury_mm_core::orderbook::OrderBook;
use treasury_mm_core::price::Price32nd;
use treasury_mm_core::ring_buffer::SpscRingBuffer;
use treasury_mm_core::{Instrument, OrderBookUpdate, QuoteManager};

fn ring() -> SpscRingBuffer<OrderBookUpdate, 4096> {
    SpscRingBuffer::new()
}

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("QuoteManager");

    group.bench_function("place_then_replace", |b| {
        let manager = QuoteManager::new();
        let r = ring();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let mut now = 1_000_000_000u64;
        b.iter(|| {
            let bid = Price32nd::new(99, (now % 32) as u8, 0);
            let ask = Price32nd::new(99, ((now % 32) + 8) as u8, 0);
            black_box(manager.process_quote_update(
                Instrument::Note10Y,
                bid,
                ask,
                1_000_000,
                1_000_000,
                now,
                &mut book,
                &r,
            ));
            now += 200_000_000;
        });
    });

    group.bench_function("validate_only", |b| {
        let manager = QuoteManager::new();
        let bid = Price32nd::new(99, 16, 0);
        let ask = Price32nd::new(99, 20, 0);
        b.iter(|| {
            black_box(manager.validate_quote(Instrument::Note10Y, bid, ask, 1_000_000, 1_000_000, 1_000_000_000));
        });
    });
}
