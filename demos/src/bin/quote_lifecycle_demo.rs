//! Walks one instrument's quote through Empty -> Live -> (rate-limited
//! replace attempt) -> cancelled, printing the validation outcome at each
//! step.
//!
//! Run with:
//!   cargo run --bin quote_lifecycle_demo

use treasury_mm_core::order::Side;
use treasury_mm_core::orderbook::{OrderBook, OrderBookUpdate};
use treasury_mm_core::price::Price32nd;
use treasury_mm_core::ring_buffer::SpscRingBuffer;
use treasury_mm_core::{Instrument, QuoteManager};
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();

    let instrument = Instrument::Note10Y;
    let manager = QuoteManager::new();
    let mut book = OrderBook::new(instrument);
    let updates: SpscRingBuffer<OrderBookUpdate, 4096> = SpscRingBuffer::new();

    let bid = Price32nd::new(99, 16, 0);
    let ask = Price32nd::new(99, 20, 0);

    let first_ns = 1_000_000_000;
    let first = manager.process_quote_update(instrument, bid, ask, 1_000_000, 1_000_000, first_ns, &mut book, &updates);
    info!(?first, "first quote placement");
    info!(state = ?manager.instrument(instrument).state(), "quote state after placement");

    let replace_bid = Price32nd::new(99, 17, 0);
    let replace_ask = Price32nd::new(99, 21, 0);
    let second = manager.process_quote_update(
        instrument,
        replace_bid,
        replace_ask,
        1_000_000,
        1_000_000,
        first_ns + 2,
        &mut book,
        &updates,
    );
    info!(?second, "immediate replace attempt (expect rate-limited)");

    manager.cancel_quotes(instrument, &mut book, &updates, first_ns + 200_000_000);
    info!(state = ?manager.instrument(instrument).state(), "quote state after cancel");

    let stats = manager.performance_stats(instrument);
    info!(accepted = stats.accepted, rejected_rate_limited = stats.rejected_rate_limited, "lifetime counters");
}
