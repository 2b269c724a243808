//! Populates a couple of books and risk states, captures a checksummed
//! snapshot, round-trips it through JSON, and tampers with it to show
//! `validate` catching the corruption.
//!
//! Run with:
//!   cargo run --bin engine_snapshot_demo

use treasury_mm_core::order::{OrderType, Side};
use treasury_mm_core::orderbook::OrderBookManager;
use treasury_mm_core::price::Price32nd;
use treasury_mm_core::{EngineSnapshotPackage, Instrument, RiskState, SnapshotFields};
use tracing::{info, warn};

fn main() {
    tracing_subscriber::fmt::init();

    let mut books = OrderBookManager::new();
    books
        .add_order(Instrument::Note10Y, 1, Side::Bid, OrderType::Limit, Price32nd::new(99, 16, 0), 1_000_000, 1)
        .unwrap();
    books
        .add_order(Instrument::Note10Y, 2, Side::Ask, OrderType::Limit, Price32nd::new(99, 20, 0), 1_000_000, 1)
        .unwrap();

    let risk = RiskState::new();
    risk.update_position(Instrument::Note10Y, 20_000_000, 99.5);

    let package = EngineSnapshotPackage::capture(&books, &risk, None, SnapshotFields::ALL, 5, 1_700_000_000_000)
        .expect("snapshot capture should not fail against in-memory state");

    let json = package.to_json().expect("serialization should succeed");
    info!(bytes = json.len(), "captured snapshot");

    let restored = EngineSnapshotPackage::from_json(&json).expect("round trip should parse");
    restored.validate().expect("freshly captured snapshot should validate");
    info!("round trip validated");

    let mut tampered = restored;
    tampered.snapshot.taken_at_ns += 1;
    match tampered.validate() {
        Ok(()) => warn!("tampered snapshot unexpectedly validated"),
        Err(err) => info!(%err, "tampered snapshot correctly rejected"),
    }
}
