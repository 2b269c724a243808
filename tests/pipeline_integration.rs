//! Cross-module properties: the decision engine's output driving the quote
//! manager driving the order book, and the snapshot format capturing the
//! result — properties no single module's unit tests can see on their own.

use treasury_mm_core::order::Side;
use treasury_mm_core::orderbook::{OrderBookManager, OrderBookUpdate};
use treasury_mm_core::price::Price32nd;
use treasury_mm_core::ring_buffer::SpscRingBuffer;
use treasury_mm_core::{
    DecisionAction, DecisionEngine, EngineConfig, EngineSnapshotPackage, FairCurveSnapshot, Instrument, MarketUpdate,
    QuoteManager, RiskState, SnapshotFields,
};

fn tight_market(instrument: Instrument) -> MarketUpdate {
    MarketUpdate {
        instrument,
        best_bid: Price32nd::from_decimal(99.5),
        best_ask: Price32nd::from_decimal(99.5625),
        bid_depth: 5_000_000,
        ask_depth: 5_000_000,
        last_trade_signed_quantity: 0,
        timestamp_ns: 1,
    }
}

#[test]
fn update_quotes_decision_lands_as_a_live_two_sided_quote() {
    let instrument = Instrument::Note10Y;
    let engine = DecisionEngine::new(EngineConfig::default());
    let risk = RiskState::new();
    let curve = FairCurveSnapshot::new();
    let quote_manager = QuoteManager::new();
    let mut books = OrderBookManager::new();

    let decision = engine.decide(&tight_market(instrument), &risk, &curve);
    assert_eq!(decision.action, DecisionAction::UpdateQuotes);

    let result = quote_manager.process_quote_update(
        instrument,
        decision.bid_price,
        decision.ask_price,
        decision.bid_size,
        decision.ask_size,
        1_000_000_000,
        books.book_mut(instrument),
        books.updates(instrument),
    );

    assert_eq!(result, treasury_mm_core::QuoteValidationResult::Valid);
    assert_eq!(books.book(instrument).get_best_bid(), Some(decision.bid_price));
    assert_eq!(books.book(instrument).get_best_ask(), Some(decision.ask_price));

    let live = quote_manager.instrument(instrument).current_quote().unwrap();
    assert_eq!(live.0, decision.bid_price.to_decimal());
    assert_eq!(live.1, decision.ask_price.to_decimal());
    assert_eq!((live.2, live.3), (decision.bid_size, decision.ask_size));
}

#[test]
fn rejected_quote_update_leaves_book_and_quote_state_untouched() {
    let instrument = Instrument::Note5Y;
    let quote_manager = QuoteManager::new();
    let mut books = OrderBookManager::new();
    let bad_bid = Price32nd::new(99, 16, 1); // not 32nd-aligned

    let result = quote_manager.process_quote_update(
        instrument,
        bad_bid,
        Price32nd::from_decimal(99.6),
        1_000_000,
        1_000_000,
        1,
        books.book_mut(instrument),
        books.updates(instrument),
    );

    assert_ne!(result, treasury_mm_core::QuoteValidationResult::Valid);
    assert_eq!(books.book(instrument).get_best_bid(), None);
    assert!(quote_manager.instrument(instrument).current_quote().is_none());
}

#[test]
fn snapshot_captures_a_live_quote_and_survives_a_round_trip() {
    let instrument = Instrument::Note10Y;
    let engine = DecisionEngine::new(EngineConfig::default());
    let risk = RiskState::new();
    let curve = FairCurveSnapshot::new();
    let quote_manager = QuoteManager::new();
    let mut books = OrderBookManager::new();

    let decision = engine.decide(&tight_market(instrument), &risk, &curve);
    quote_manager.process_quote_update(
        instrument,
        decision.bid_price,
        decision.ask_price,
        decision.bid_size,
        decision.ask_size,
        1_000_000_000,
        books.book_mut(instrument),
        books.updates(instrument),
    );
    risk.update_position(instrument, 5_000_000, decision.bid_price.to_decimal());

    let package = EngineSnapshotPackage::capture(&books, &risk, None, SnapshotFields::ALL, 3, 1_000)
        .expect("capture should succeed against a freshly built engine");
    package.validate().expect("freshly captured package should validate");

    let json = package.to_json().unwrap();
    let restored = EngineSnapshotPackage::from_json(&json).unwrap();
    restored.validate().expect("round-tripped package should still validate");

    let entry = restored
        .snapshot
        .instruments
        .iter()
        .find(|e| e.instrument == Some(instrument))
        .unwrap();
    assert_eq!(entry.best_bid, Some(decision.bid_price));
    assert_eq!(entry.position, Some(5_000_000));
}

#[test]
fn ring_buffer_delivers_book_updates_in_fifo_order_as_a_real_producer_consumer_pair() {
    let instrument = Instrument::Bond30Y;
    let quote_manager = QuoteManager::new();
    let mut books = OrderBookManager::new();

    for i in 0..5u64 {
        let now = 1_000_000_000 + i * 200_000_000;
        let bid = Price32nd::from_decimal(98.0 + i as f64 * 0.03125);
        let ask = Price32nd::from_decimal(98.5 + i as f64 * 0.03125);
        quote_manager.process_quote_update(
            instrument,
            bid,
            ask,
            1_000_000,
            1_000_000,
            now,
            books.book_mut(instrument),
            books.updates(instrument),
        );
    }

    let ring: &SpscRingBuffer<OrderBookUpdate, { treasury_mm_core::orderbook::BOOK_UPDATE_RING_CAPACITY }> =
        books.updates(instrument);
    let mut drained = Vec::new();
    while let Some(update) = ring.try_pop() {
        drained.push(update);
    }

    assert!(!drained.is_empty());
    let mut last_seen: Option<u64> = None;
    for update in &drained {
        if let Some(prev) = last_seen {
            assert!(update.timestamp_ns >= prev, "updates must drain in non-decreasing timestamp order");
        }
        last_seen = Some(update.timestamp_ns);
        assert_eq!(update.side == Side::Bid || update.side == Side::Ask, true);
    }
}
