//! Runs the same market update through the decision pipeline under three
//! risk postures: flat, long-and-skewed, and over the position cap.
//!
//! Run with:
//!   cargo run --bin decision_pipeline_demo

use treasury_mm_core::price::Price32nd;
use treasury_mm_core::{DecisionEngine, EngineConfig, FairCurveSnapshot, Instrument, MarketUpdate, RiskState};
use tracing::info;

fn market_update(instrument: Instrument) -> MarketUpdate {
    MarketUpdate {
        instrument,
        best_bid: Price32nd::new(99, 16, 0),
        best_ask: Price32nd::new(99, 20, 0),
        bid_depth: 2_000_000,
        ask_depth: 1_500_000,
        last_trade_signed_quantity: 250_000,
        timestamp_ns: 1,
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let instrument = Instrument::Note10Y;
    let config = EngineConfig::default();
    let engine = DecisionEngine::new(config.clone());
    let curve = FairCurveSnapshot::new();
    let update = market_update(instrument);

    let flat_risk = RiskState::new();
    let flat_decision = engine.decide(&update, &flat_risk, &curve);
    info!(action = ?flat_decision.action, bid = ?flat_decision.bid_price, ask = ?flat_decision.ask_price, "flat book, flat position");

    let long_risk = RiskState::new();
    long_risk.update_position(instrument, 40_000_000, 99.6);
    curve.publish(instrument, 420.0, 99.1, 0.04, 1);
    let long_decision = engine.decide(&update, &long_risk, &curve);
    info!(action = ?long_decision.action, bid = ?long_decision.bid_price, ask = ?long_decision.ask_price, "long position with fair-curve reversion");

    let capped_risk = RiskState::new();
    capped_risk.update_position(instrument, config.position_cap, 99.6);
    let capped_decision = engine.decide(&update, &capped_risk, &curve);
    info!(action = ?capped_decision.action, latency_ns = capped_decision.decision_latency_ns, "position at cap");
}
