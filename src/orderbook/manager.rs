//! Owns one [`OrderBook`] and one outbound update ring per instrument.
//!
//! Grounded on the reference desk's book-manager pattern of holding several
//! books behind a single lookup surface, narrowed here to the crate's fixed,
//! six-instrument universe instead of an open string-keyed map: a lookup
//! never allocates and never misses.

use super::book::OrderBook;
use super::error::OrderBookError;
use super::update::OrderBookUpdate;
use super::BOOK_UPDATE_RING_CAPACITY;
use crate::instrument::{Instrument, PerInstrument};
use crate::order::{OrderType, Side};
use crate::price::Price32nd;
use crate::ring_buffer::SpscRingBuffer;
use tracing::info;

/// Per-instrument order books plus their outbound update rings.
pub struct OrderBookManager {
    books: PerInstrument<OrderBook>,
    updates: PerInstrument<SpscRingBuffer<OrderBookUpdate, BOOK_UPDATE_RING_CAPACITY>>,
}

impl OrderBookManager {
    /// Builds a fresh, empty book and ring for every instrument.
    pub fn new() -> OrderBookManager {
        OrderBookManager {
            books: Instrument::ALL.map(OrderBook::new),
            updates: Instrument::ALL.map(|_| SpscRingBuffer::new()),
        }
    }

    /// Shared read access to `instrument`'s book.
    #[inline]
    pub fn book(&self, instrument: Instrument) -> &OrderBook {
        &self.books[instrument.index()]
    }

    /// Exclusive access to `instrument`'s book.
    #[inline]
    pub fn book_mut(&mut self, instrument: Instrument) -> &mut OrderBook {
        &mut self.books[instrument.index()]
    }

    /// `instrument`'s outbound update ring, for a consumer thread to drain.
    #[inline]
    pub fn updates(&self, instrument: Instrument) -> &SpscRingBuffer<OrderBookUpdate, BOOK_UPDATE_RING_CAPACITY> {
        &self.updates[instrument.index()]
    }

    /// Adds a resting order to `instrument`'s book.
    #[allow(clippy::too_many_arguments)]
    pub fn add_order(
        &mut self,
        instrument: Instrument,
        order_id: u64,
        side: Side,
        order_type: OrderType,
        price: Price32nd,
        quantity: u64,
        timestamp_ns: u64,
    ) -> Result<(), OrderBookError> {
        let idx = instrument.index();
        self.books[idx].add_order(order_id, side, order_type, price, quantity, timestamp_ns, &self.updates[idx])
    }

    /// Cancels a resting order on `instrument`'s book.
    pub fn cancel_order(&mut self, instrument: Instrument, order_id: u64, timestamp_ns: u64) -> Result<(), OrderBookError> {
        let idx = instrument.index();
        self.books[idx].cancel_order(order_id, timestamp_ns, &self.updates[idx])
    }

    /// Modifies a resting order on `instrument`'s book (cancel-and-replace).
    pub fn modify_order(
        &mut self,
        instrument: Instrument,
        order_id: u64,
        new_price: Price32nd,
        new_quantity: u64,
        timestamp_ns: u64,
    ) -> Result<(), OrderBookError> {
        let idx = instrument.index();
        self.books[idx].modify_order(order_id, new_price, new_quantity, timestamp_ns, &self.updates[idx])
    }

    /// Applies a trade print to `instrument`'s book.
    pub fn process_trade(&mut self, instrument: Instrument, side: Side, price: Price32nd, quantity: u64, timestamp_ns: u64) {
        let idx = instrument.index();
        self.books[idx].process_trade(side, price, quantity, timestamp_ns, &self.updates[idx]);
    }

    /// Resets every instrument's book to its pristine state.
    pub fn reset_all(&mut self) {
        for book in &mut self.books {
            book.reset();
        }
        info!("order book manager reset: every instrument book returned to pristine state");
    }
}

impl Default for OrderBookManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn books_are_isolated_per_instrument() {
        let mut mgr = OrderBookManager::new();
        mgr.add_order(Instrument::Note10Y, 1, Side::Bid, OrderType::Limit, Price32nd::new(99, 16, 0), 100, 1)
            .unwrap();
        assert_eq!(mgr.book(Instrument::Note10Y).get_best_bid(), Some(Price32nd::new(99, 16, 0)));
        assert_eq!(mgr.book(Instrument::Note5Y).get_best_bid(), None);
    }

    #[test]
    fn reset_all_clears_every_book() {
        let mut mgr = OrderBookManager::new();
        for instr in Instrument::ALL {
            mgr.add_order(instr, 1, Side::Bid, OrderType::Limit, Price32nd::new(99, 16, 0), 100, 1).unwrap();
        }
        mgr.reset_all();
        for instr in Instrument::ALL {
            assert_eq!(mgr.book(instr).get_best_bid(), None);
        }
    }
}
