//! Two-sided quote lifecycle and validation.
//!
//! Each instrument's quote moves `Empty -> Pending -> Live -> Pending ->
//! Empty`: `Pending` covers both the brief window while a new quote is
//! being placed and the window while a live quote is being torn down.
//! Validation order matches the reference desk's `validate_quote` exactly,
//! since strategy logic elsewhere depends on which check fails first.

use crate::instrument::{Instrument, PerInstrument, NUM_INSTRUMENTS};
use crate::order::{OrderType, Side};
use crate::orderbook::{OrderBook, OrderBookUpdate};
use crate::price::{Price32nd, MIN_TICK_32NDS};
use crate::ring_buffer::SpscRingBuffer;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use tracing::warn;

/// Minimum two-sided quote size, in notional dollars.
pub const MIN_QUOTE_SIZE: u64 = 100_000;
/// Maximum two-sided quote size, in notional dollars.
pub const MAX_QUOTE_SIZE: u64 = 50_000_000;
/// Minimum bid/ask spread, in 32nds.
pub const MIN_SPREAD_32NDS: f64 = MIN_TICK_32NDS;
/// Minimum price change, in 32nds, that justifies replacing a live quote.
pub const PRICE_UPDATE_THRESHOLD_32NDS: f64 = 0.5 / 32.0;
/// Minimum fractional size change that justifies replacing a live quote.
pub const SIZE_UPDATE_THRESHOLD_PERCENT: f64 = 0.1;
/// Minimum nanoseconds between successive quote updates for one instrument.
pub const MAX_QUOTE_UPDATE_FREQUENCY_NS: u64 = 100_000_000;

/// Outcome of [`QuoteManager::validate_quote`] and [`QuoteManager::process_quote_update`].
/// Variants are listed, and checked, in priority order: the first
/// applicable failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteValidationResult {
    /// The quote passed every check and may be applied.
    Valid,
    /// Bid or ask price is not aligned to the 32nd grid.
    InvalidPriceIncrement,
    /// Bid price is not strictly below ask price.
    InvalidPriceOrder,
    /// `ask - bid` is narrower than [`MIN_SPREAD_32NDS`].
    InvalidSpread,
    /// A requested size falls outside `[MIN_QUOTE_SIZE, MAX_QUOTE_SIZE]`.
    InvalidSize,
    /// Fewer than [`MAX_QUOTE_UPDATE_FREQUENCY_NS`] nanoseconds have passed
    /// since the last accepted update for this instrument.
    RateLimited,
    /// The requested quote is not different enough from the live quote to
    /// justify a replace.
    UpdateNotNeeded,
    /// Validation passed but a resting order leg could not be placed (order
    /// pool exhaustion); the quote was rolled back to `Empty`.
    PlacementFailed,
}

/// Lifecycle state of one instrument's two-sided quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuoteState {
    /// No resting quote.
    Empty = 0,
    /// A quote placement or teardown is in flight.
    Pending = 1,
    /// A two-sided quote is resting in the book.
    Live = 2,
}

impl QuoteState {
    fn from_u8(v: u8) -> QuoteState {
        match v {
            0 => QuoteState::Empty,
            1 => QuoteState::Pending,
            _ => QuoteState::Live,
        }
    }
}

#[inline]
fn price_bits_to_decimal(bits: u64) -> f64 {
    f64::from_bits(bits)
}

/// One instrument's live quote: prices, sizes, resting order ids and
/// bookkeeping, all independently atomic so a reader never blocks the
/// quoting thread.
#[repr(align(64))]
pub struct InstrumentQuoteState {
    state: AtomicU8,
    bid_price_bits: AtomicU64,
    ask_price_bits: AtomicU64,
    bid_size: AtomicU64,
    ask_size: AtomicU64,
    bid_order_id: AtomicU64,
    ask_order_id: AtomicU64,
    last_update_ns: AtomicU64,
    update_count_today: AtomicU64,
    next_order_sequence: AtomicU64,
}

impl InstrumentQuoteState {
    fn new() -> InstrumentQuoteState {
        InstrumentQuoteState {
            state: AtomicU8::new(QuoteState::Empty as u8),
            bid_price_bits: AtomicU64::new(0),
            ask_price_bits: AtomicU64::new(0),
            bid_size: AtomicU64::new(0),
            ask_size: AtomicU64::new(0),
            bid_order_id: AtomicU64::new(0),
            ask_order_id: AtomicU64::new(0),
            last_update_ns: AtomicU64::new(0),
            update_count_today: AtomicU64::new(0),
            next_order_sequence: AtomicU64::new(1),
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> QuoteState {
        QuoteState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Live bid/ask decimal prices and sizes, or `None` outside `Live`.
    pub fn current_quote(&self) -> Option<(f64, f64, u64, u64)> {
        if self.state() != QuoteState::Live {
            return None;
        }
        Some((
            price_bits_to_decimal(self.bid_price_bits.load(Ordering::Acquire)),
            price_bits_to_decimal(self.ask_price_bits.load(Ordering::Acquire)),
            self.bid_size.load(Ordering::Acquire),
            self.ask_size.load(Ordering::Acquire),
        ))
    }

    /// Orders submitted for this instrument's quote since the last daily reset.
    #[inline]
    pub fn update_count_today(&self) -> u64 {
        self.update_count_today.load(Ordering::Acquire)
    }

    /// Bid/ask decimal prices and sizes regardless of lifecycle state: all
    /// zero for an instrument that has never had a quote placed.
    fn raw_quote(&self) -> (f64, f64, u64, u64) {
        (
            price_bits_to_decimal(self.bid_price_bits.load(Ordering::Acquire)),
            price_bits_to_decimal(self.ask_price_bits.load(Ordering::Acquire)),
            self.bid_size.load(Ordering::Acquire),
            self.ask_size.load(Ordering::Acquire),
        )
    }
}

impl Default for InstrumentQuoteState {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters for [`QuoteManager::validate_quote`] outcomes, surfaced
/// via [`QuoteManager::performance_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteManagerStats {
    /// Total `validate_quote` calls.
    pub validations_total: u64,
    /// Quotes accepted and applied.
    pub accepted: u64,
    /// Rejected for unaligned prices.
    pub rejected_price_increment: u64,
    /// Rejected for bid >= ask.
    pub rejected_price_order: u64,
    /// Rejected for too-narrow spread.
    pub rejected_spread: u64,
    /// Rejected for out-of-bounds size.
    pub rejected_size: u64,
    /// Skipped because the change was below the update threshold.
    pub skipped_update_not_needed: u64,
    /// Rejected for exceeding the update-frequency cap.
    pub rejected_rate_limited: u64,
    /// Pool-exhaustion rollbacks during `process_quote_update`.
    pub rollbacks: u64,
}

/// Owns quote state and validation counters for every instrument.
pub struct QuoteManager {
    per_instrument: PerInstrument<InstrumentQuoteState>,
    stats: PerInstrument<std::cell::Cell<QuoteManagerStats>>,
}

impl QuoteManager {
    /// Builds a quote manager with every instrument `Empty`.
    pub fn new() -> QuoteManager {
        QuoteManager {
            per_instrument: std::array::from_fn(|_| InstrumentQuoteState::new()),
            stats: std::array::from_fn(|_| std::cell::Cell::new(QuoteManagerStats::default())),
        }
    }

    /// Read access to an instrument's live quote state.
    #[inline]
    pub fn instrument(&self, instrument: Instrument) -> &InstrumentQuoteState {
        &self.per_instrument[instrument.index()]
    }

    /// Validation/update counters for `instrument`.
    #[inline]
    pub fn performance_stats(&self, instrument: Instrument) -> QuoteManagerStats {
        self.stats[instrument.index()].get()
    }

    fn with_stats<R>(&self, instrument: Instrument, f: impl FnOnce(&mut QuoteManagerStats) -> R) -> R {
        let cell = &self.stats[instrument.index()];
        let mut stats = cell.get();
        let result = f(&mut stats);
        cell.set(stats);
        result
    }

    /// Checks a proposed quote against grid, ordering, spread, size,
    /// rate-limit and change-threshold rules, in that order, without
    /// mutating any state. Rate-limit and change-threshold are evaluated
    /// unconditionally against the instrument's current (possibly all-zero)
    /// quote state, not just while a quote is `Live`.
    pub fn validate_quote(
        &self,
        instrument: Instrument,
        bid: Price32nd,
        ask: Price32nd,
        bid_size: u64,
        ask_size: u64,
        now_ns: u64,
    ) -> QuoteValidationResult {
        if !bid.is_32nds_aligned() || !ask.is_32nds_aligned() {
            return QuoteValidationResult::InvalidPriceIncrement;
        }
        if bid >= ask {
            return QuoteValidationResult::InvalidPriceOrder;
        }
        if ask.abs_diff(bid) < MIN_SPREAD_32NDS - f64::EPSILON {
            return QuoteValidationResult::InvalidSpread;
        }
        if bid_size < MIN_QUOTE_SIZE
            || bid_size > MAX_QUOTE_SIZE
            || ask_size < MIN_QUOTE_SIZE
            || ask_size > MAX_QUOTE_SIZE
        {
            return QuoteValidationResult::InvalidSize;
        }

        let state = self.instrument(instrument);
        let last_update = state.last_update_ns.load(Ordering::Acquire);
        if now_ns.saturating_sub(last_update) < MAX_QUOTE_UPDATE_FREQUENCY_NS {
            return QuoteValidationResult::RateLimited;
        }

        let (live_bid, live_ask, live_bid_size, live_ask_size) = state.raw_quote();
        let price_moved = (bid.to_decimal() - live_bid).abs() >= PRICE_UPDATE_THRESHOLD_32NDS
            || (ask.to_decimal() - live_ask).abs() >= PRICE_UPDATE_THRESHOLD_32NDS;
        let size_moved = fractional_change(live_bid_size, bid_size) >= SIZE_UPDATE_THRESHOLD_PERCENT
            || fractional_change(live_ask_size, ask_size) >= SIZE_UPDATE_THRESHOLD_PERCENT;
        if !price_moved && !size_moved {
            return QuoteValidationResult::UpdateNotNeeded;
        }

        QuoteValidationResult::Valid
    }

    /// Validates and, if accepted, applies a new two-sided quote for
    /// `instrument`: cancels any live resting orders, submits fresh bid/ask
    /// limit orders, and rolls back to `Empty` if the ask leg cannot be
    /// placed after the bid leg succeeded (order-pool exhaustion).
    #[allow(clippy::too_many_arguments)]
    pub fn process_quote_update<const N: usize>(
        &self,
        instrument: Instrument,
        bid: Price32nd,
        ask: Price32nd,
        bid_size: u64,
        ask_size: u64,
        now_ns: u64,
        book: &mut OrderBook,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
    ) -> QuoteValidationResult {
        let result = self.validate_quote(instrument, bid, ask, bid_size, ask_size, now_ns);
        self.with_stats(instrument, |stats| {
            stats.validations_total += 1;
            match result {
                QuoteValidationResult::InvalidPriceIncrement => stats.rejected_price_increment += 1,
                QuoteValidationResult::InvalidPriceOrder => stats.rejected_price_order += 1,
                QuoteValidationResult::InvalidSpread => stats.rejected_spread += 1,
                QuoteValidationResult::InvalidSize => stats.rejected_size += 1,
                QuoteValidationResult::UpdateNotNeeded => stats.skipped_update_not_needed += 1,
                QuoteValidationResult::RateLimited => stats.rejected_rate_limited += 1,
                QuoteValidationResult::Valid | QuoteValidationResult::PlacementFailed => {}
            }
        });
        if result != QuoteValidationResult::Valid {
            return result;
        }

        let state = self.instrument(instrument);
        self.cancel_resting(instrument, book, updates, now_ns);

        let bid_id = self.next_order_id(instrument);
        let bid_placed = book
            .add_order(bid_id, Side::Bid, OrderType::Limit, bid, bid_size, now_ns, updates)
            .is_ok();
        if !bid_placed {
            state.state.store(QuoteState::Empty as u8, Ordering::Release);
            warn!(instrument = %instrument, "bid leg failed to place, quote left empty");
            return QuoteValidationResult::PlacementFailed;
        }

        let ask_id = self.next_order_id(instrument);
        let ask_placed = book
            .add_order(ask_id, Side::Ask, OrderType::Limit, ask, ask_size, now_ns, updates)
            .is_ok();
        if !ask_placed {
            let _ = book.cancel_order(bid_id, now_ns, updates);
            state.state.store(QuoteState::Empty as u8, Ordering::Release);
            self.with_stats(instrument, |stats| stats.rollbacks += 1);
            warn!(instrument = %instrument, "ask leg failed after bid placed, rolled back to empty");
            return QuoteValidationResult::PlacementFailed;
        }

        state.bid_price_bits.store(bid.to_decimal().to_bits(), Ordering::Release);
        state.ask_price_bits.store(ask.to_decimal().to_bits(), Ordering::Release);
        state.bid_size.store(bid_size, Ordering::Release);
        state.ask_size.store(ask_size, Ordering::Release);
        state.bid_order_id.store(bid_id, Ordering::Release);
        state.ask_order_id.store(ask_id, Ordering::Release);
        state.last_update_ns.store(now_ns, Ordering::Release);
        state.update_count_today.fetch_add(1, Ordering::AcqRel);
        state.state.store(QuoteState::Live as u8, Ordering::Release);
        self.with_stats(instrument, |stats| stats.accepted += 1);
        QuoteValidationResult::Valid
    }

    /// Cancels `instrument`'s live quote, if any, leaving it `Empty`.
    pub fn cancel_quotes<const N: usize>(
        &self,
        instrument: Instrument,
        book: &mut OrderBook,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
        now_ns: u64,
    ) {
        self.cancel_resting(instrument, book, updates, now_ns);
    }

    fn cancel_resting<const N: usize>(
        &self,
        instrument: Instrument,
        book: &mut OrderBook,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
        now_ns: u64,
    ) {
        let state = self.instrument(instrument);
        if state.state() == QuoteState::Empty {
            return;
        }
        state.state.store(QuoteState::Pending as u8, Ordering::Release);
        let bid_id = state.bid_order_id.swap(0, Ordering::AcqRel);
        let ask_id = state.ask_order_id.swap(0, Ordering::AcqRel);
        if bid_id != 0 {
            let _ = book.cancel_order(bid_id, now_ns, updates);
        }
        if ask_id != 0 {
            let _ = book.cancel_order(ask_id, now_ns, updates);
        }
        state.state.store(QuoteState::Empty as u8, Ordering::Release);
    }

    fn next_order_id(&self, instrument: Instrument) -> u64 {
        let sequence = self.instrument(instrument).next_order_sequence.fetch_add(1, Ordering::AcqRel);
        ((instrument.index() as u64 + 1) << 48) | sequence
    }
}

impl Default for QuoteManager {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn fractional_change(old: u64, new: u64) -> f64 {
    if old == 0 {
        return if new == 0 { 0.0 } else { 1.0 };
    }
    ((new as f64) - (old as f64)).abs() / (old as f64)
}

const _: () = assert!(NUM_INSTRUMENTS == 6, "quote manager assumes six instruments");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;

    // A fresh instrument's `last_update_ns` starts at zero, so the first-ever
    // call on it must itself be past the rate-limit window for the clock
    // value supplied, same as a real monotonic/epoch timestamp always is.
    const FIRST_NS: u64 = 1_000_000_000;
    const AFTER_RATE_WINDOW_NS: u64 = FIRST_NS + MAX_QUOTE_UPDATE_FREQUENCY_NS + 1;

    fn p(whole: u32, ticks: u8) -> Price32nd {
        Price32nd::new(whole, ticks, 0)
    }

    #[test]
    fn rejects_unaligned_price_first() {
        let mgr = QuoteManager::new();
        let unaligned = Price32nd::new(99, 16, 1);
        let result = mgr.validate_quote(Instrument::Note10Y, unaligned, p(99, 20), 1_000_000, 1_000_000, FIRST_NS);
        assert_eq!(result, QuoteValidationResult::InvalidPriceIncrement);
    }

    #[test]
    fn rejects_crossed_quote() {
        let mgr = QuoteManager::new();
        let result = mgr.validate_quote(Instrument::Note10Y, p(99, 20), p(99, 16), 1_000_000, 1_000_000, FIRST_NS);
        assert_eq!(result, QuoteValidationResult::InvalidPriceOrder);
    }

    #[test]
    fn equal_bid_and_ask_is_rejected_as_price_order() {
        let mgr = QuoteManager::new();
        let result = mgr.validate_quote(Instrument::Note10Y, p(99, 16), p(99, 16), 1_000_000, 1_000_000, FIRST_NS);
        assert_eq!(result, QuoteValidationResult::InvalidPriceOrder);
    }

    #[test]
    fn minimum_one_tick_spread_is_accepted() {
        let mgr = QuoteManager::new();
        let result = mgr.validate_quote(Instrument::Note10Y, p(99, 16), p(99, 17), 1_000_000, 1_000_000, FIRST_NS);
        assert_eq!(result, QuoteValidationResult::Valid);
    }

    #[test]
    fn rejects_undersized_quote() {
        let mgr = QuoteManager::new();
        let result = mgr.validate_quote(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000, 1_000_000, FIRST_NS);
        assert_eq!(result, QuoteValidationResult::InvalidSize);
    }

    #[test]
    fn fresh_instrument_accepts_first_valid_quote() {
        let mgr = QuoteManager::new();
        let result = mgr.validate_quote(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000_000, 1_000_000, FIRST_NS);
        assert_eq!(result, QuoteValidationResult::Valid);
    }

    #[test]
    fn process_quote_update_places_both_legs_and_tracks_state() {
        let mgr = QuoteManager::new();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let ring: SpscRingBuffer<OrderBookUpdate, 64> = SpscRingBuffer::new();
        let result = mgr.process_quote_update(
            Instrument::Note10Y,
            p(99, 16),
            p(99, 20),
            1_000_000,
            1_000_000,
            FIRST_NS,
            &mut book,
            &ring,
        );
        assert_eq!(result, QuoteValidationResult::Valid);
        assert_eq!(mgr.instrument(Instrument::Note10Y).state(), QuoteState::Live);
        assert_eq!(book.get_best_bid(), Some(p(99, 16)));
        assert_eq!(book.get_best_ask(), Some(p(99, 20)));
    }

    #[test]
    fn resubmitting_inside_rate_window_is_rate_limited_even_if_unchanged() {
        let mgr = QuoteManager::new();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let ring: SpscRingBuffer<OrderBookUpdate, 64> = SpscRingBuffer::new();
        mgr.process_quote_update(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000_000, 1_000_000, FIRST_NS, &mut book, &ring);

        // Same prices and sizes, but still inside the rate-limit window:
        // rate-limit is checked before the change-threshold, so this is
        // RateLimited rather than UpdateNotNeeded.
        let result = mgr.validate_quote(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000_000, 1_000_000, FIRST_NS + 1);
        assert_eq!(result, QuoteValidationResult::RateLimited);
    }

    #[test]
    fn update_not_needed_when_unchanged_quote_resubmitted_after_rate_window() {
        let mgr = QuoteManager::new();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let ring: SpscRingBuffer<OrderBookUpdate, 64> = SpscRingBuffer::new();
        mgr.process_quote_update(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000_000, 1_000_000, FIRST_NS, &mut book, &ring);

        let result = mgr.validate_quote(
            Instrument::Note10Y,
            p(99, 16),
            p(99, 20),
            1_000_000,
            1_000_000,
            AFTER_RATE_WINDOW_NS,
        );
        assert_eq!(result, QuoteValidationResult::UpdateNotNeeded);
    }

    #[test]
    fn placement_failure_is_distinct_from_valid() {
        use crate::order::OrderType;
        use crate::orderbook::ORDER_POOL_CAPACITY;

        let mgr = QuoteManager::new();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let ring: SpscRingBuffer<OrderBookUpdate, 64> = SpscRingBuffer::new();
        // Exhaust the order pool at a price away from the quote under test
        // so the bid leg has nowhere left to go.
        for i in 0..ORDER_POOL_CAPACITY as u64 {
            book.add_order(10_000 + i, Side::Bid, OrderType::Limit, p(90, 0), 1_000, FIRST_NS, &ring)
                .unwrap();
        }

        let result = mgr.process_quote_update(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000_000, 1_000_000, FIRST_NS, &mut book, &ring);
        assert_eq!(result, QuoteValidationResult::PlacementFailed);
        assert_ne!(result, QuoteValidationResult::Valid);
        assert_eq!(mgr.instrument(Instrument::Note10Y).state(), QuoteState::Empty);
    }

    #[test]
    fn cancel_quotes_returns_instrument_to_empty() {
        let mgr = QuoteManager::new();
        let mut book = OrderBook::new(Instrument::Note10Y);
        let ring: SpscRingBuffer<OrderBookUpdate, 64> = SpscRingBuffer::new();
        mgr.process_quote_update(Instrument::Note10Y, p(99, 16), p(99, 20), 1_000_000, 1_000_000, FIRST_NS, &mut book, &ring);
        mgr.cancel_quotes(Instrument::Note10Y, &mut book, &ring, FIRST_NS + 1);
        assert_eq!(mgr.instrument(Instrument::Note10Y).state(), QuoteState::Empty);
        assert_eq!(book.get_best_bid(), None);
        assert_eq!(book.get_best_ask(), None);
    }
}
