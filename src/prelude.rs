//! Convenience re-exports of the types most callers need.
//!
//! ```
//! use treasury_mm_core::prelude::*;
//! ```

pub use crate::config::EngineConfig;
pub use crate::decision::{DecisionAction, DecisionEngine, MarketUpdate, TradingDecision};
pub use crate::fair_curve::FairCurveSnapshot;
pub use crate::instrument::{Instrument, PerInstrument, NUM_INSTRUMENTS};
pub use crate::metrics::EngineMetrics;
pub use crate::order::{Order, OrderType, Side};
pub use crate::orderbook::{BookStats, OrderBook, OrderBookError, OrderBookManager, OrderBookUpdate, UpdateKind};
pub use crate::pool::{ObjectPool, Slot};
pub use crate::price::Price32nd;
pub use crate::quote_manager::{QuoteManager, QuoteManagerStats, QuoteState, QuoteValidationResult};
pub use crate::ring_buffer::SpscRingBuffer;
pub use crate::risk::{InstrumentRiskState, PortfolioRisk, RiskState};
pub use crate::snapshot::{EngineSnapshot, EngineSnapshotPackage, SnapshotError, SnapshotFields};
