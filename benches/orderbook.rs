//! Order book add/cancel/depth operations at the sizes the hot path targets.

use criterion::{BenchmarkId, Criterion};
use std::hint::black_box;
use treasury_mm_core::order::{OrderType, Side};
use treasury_mm_core::orderbook::OrderBook;
use treasury_mm_core::price::Price32nd;
use treasury_mm_core::ring_buffer::SpscRingBuffer;
use treasury_mm_core::{Instrument, OrderBookUpdate};

fn ring() -> SpscRingBuffer<OrderBookUpdate, 4096> {
    SpscRingBuffer::new()
}

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrderBook");

    group.bench_function("add_order_new_level", |b| {
        let r = ring();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let mut id = 1u64;
        b.iter(|| {
            let price = Price32nd::new(99, (id % 32) as u8, 0);
            book.add_order(id, Side::Bid, OrderType::Limit, price, 1_000_000, id, &r).unwrap();
            id += 1;
        });
    });

    group.bench_function("add_cancel_same_level", |b| {
        let r = ring();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let price = Price32nd::new(99, 16, 0);
        let mut id = 1u64;
        b.iter(|| {
            book.add_order(id, Side::Bid, OrderType::Limit, price, 1_000_000, id, &r).unwrap();
            book.cancel_order(id, id, &r).unwrap();
            id += 1;
        });
    });

    for &depth in &[1usize, 5, 20] {
        group.bench_with_input(BenchmarkId::new("get_market_depth", depth), &depth, |b, &depth| {
            let r = ring();
            let mut book = OrderBook::new(Instrument::Note10Y);
            for i in 0..200u64 {
                let price = Price32nd::new(99, (i % 32) as u8, 0);
                book.add_order(i + 1, Side::Bid, OrderType::Limit, price, 1_000_000, i, &r).unwrap();
            }
            b.iter(|| black_box(book.get_market_depth(Side::Bid, depth)));
        });
    }
}
