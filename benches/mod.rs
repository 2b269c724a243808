use criterion::{criterion_group, criterion_main};

mod orderbook;
mod quote_manager;
mod ring_buffer;

use decision::register_benchmarks as register_decision_benchmarks;
use orderbook::register_benchmarks as register_orderbook_benchmarks;
use pool::register_benchmarks as register_pool_benchmarks;
use quote_manager::register_benchmarks as register_quote_manager_benchmarks;
use ring_buffer::register_benchmarks as register_ring_buffer_benchmarks;

criterion_group!(
    benches,
    register_pool_benchmarks,
    register_ring_buffer_benchmarks,
    register_orderbook_benchmarks,
    register_quote_manager_benchmarks,
    register_decision_benchmarks,
);

criterion_main!(benches);
