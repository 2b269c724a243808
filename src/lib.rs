//! # Treasury Market-Making Core
//!
//! A deterministic, zero-allocation-on-the-hot-path engine core for
//! quoting the on-the-run U.S. Treasury curve: a fixed-capacity object
//! pool, an SPSC ring buffer for book-change events, a 32nd-denominated
//! price type, a price-time-priority limit order book, a budgeted
//! three-phase decision pipeline, a two-sided quote lifecycle manager,
//! lock-free per-instrument risk state, and a checksummed snapshot format
//! for operator tooling.
//!
//! ## Design
//!
//! - **Single-threaded per instrument.** Each instrument's [`orderbook::OrderBook`]
//!   is driven by exactly one thread; cross-instrument parallelism comes from
//!   running one such thread per instrument, not from locking inside a book.
//! - **No steady-state allocation.** Orders and price levels live in fixed
//!   [`pool::ObjectPool`]s; book-change events cross thread boundaries through
//!   a fixed [`ring_buffer::SpscRingBuffer`]. Both are sized at construction and
//!   never grow.
//! - **Everything else is atomics.** Risk and fair-value state
//!   ([`risk::RiskState`], [`fair_curve::FairCurveSnapshot`]) are read by the
//!   decision engine without taking a lock; floating-point accumulators use a
//!   compare-and-swap retry loop since there is no native atomic `f64`.
//!
//! ## Feature flags
//!
//! - `timed`: records acquire/release latency histograms on every
//!   [`pool::ObjectPool`] via `hdrhistogram`.
//! - `wire`: adds a fixed 48-byte [`orderbook::update::WireOrderBookUpdate`]
//!   encoding for [`orderbook::OrderBookUpdate`] via `zerocopy`.
//! - `metrics`: forwards [`metrics::EngineMetrics`] counters to the `metrics`
//!   crate's global recorder.

pub mod config;
pub mod decision;
pub mod fair_curve;
pub mod instrument;
pub mod metrics;
pub mod order;
pub mod orderbook;
pub mod pool;
pub mod price;
pub mod prelude;
pub mod quote_manager;
pub mod ring_buffer;
pub mod risk;
pub mod snapshot;

pub use config::EngineConfig;
pub use decision::{DecisionAction, DecisionEngine, MarketUpdate, TradingDecision};
pub use fair_curve::FairCurveSnapshot;
pub use instrument::{Instrument, PerInstrument, NUM_INSTRUMENTS};
pub use metrics::EngineMetrics;
pub use order::{Order, OrderType, Side};
pub use orderbook::{BookStats, OrderBook, OrderBookError, OrderBookManager, OrderBookUpdate};
pub use pool::{ObjectPool, Slot};
pub use price::Price32nd;
pub use quote_manager::{QuoteManager, QuoteValidationResult};
pub use ring_buffer::SpscRingBuffer;
pub use risk::RiskState;
pub use snapshot::{EngineSnapshot, EngineSnapshotPackage, SnapshotError, SnapshotFields};
