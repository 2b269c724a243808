//! Per-instrument limit order book: price-time priority, O(1)
//! best-of-side, bounded capacity, zero steady-state allocation.
//!
//! Invariants maintained by every public method:
//! - Bid levels are strictly descending from `bid_head`, ask levels
//!   strictly ascending from `ask_head`.
//! - Within a level, orders are strict FIFO by arrival sequence.
//! - `get_best_bid()`/`get_best_ask()` are O(1) (cached list heads).
//! - Releasing every order returns the book to its pristine capacity
//!   (no slot leaks across any sequence of add/cancel/modify).

use super::error::OrderBookError;
use super::level::PriceLevel;
use super::stats::BookStats;
use super::update::{OrderBookUpdate, UpdateKind};
use super::{LEVEL_POOL_CAPACITY, ORDER_POOL_CAPACITY};
use crate::instrument::Instrument;
use crate::order::{Order, OrderType, Side};
use crate::pool::{ObjectPool, Slot};
use crate::price::Price32nd;
use crate::ring_buffer::SpscRingBuffer;
use std::collections::HashMap;
use tracing::warn;

/// A single instrument's limit order book.
///
/// Not `Sync`: one book is owned and driven by exactly one thread, matching
/// the crate's single-thread-per-instrument design.
pub struct OrderBook {
    instrument: Instrument,
    orders: ObjectPool<Order, ORDER_POOL_CAPACITY>,
    levels: ObjectPool<PriceLevel, LEVEL_POOL_CAPACITY>,
    bid_head: Option<Slot<PriceLevel>>,
    ask_head: Option<Slot<PriceLevel>>,
    bid_price_index: HashMap<Price32nd, Slot<PriceLevel>>,
    ask_price_index: HashMap<Price32nd, Slot<PriceLevel>>,
    order_index: HashMap<u64, Slot<Order>>,
    next_sequence: u64,
    last_trade_price: Option<Price32nd>,
    stats: BookStats,
}

impl OrderBook {
    /// Builds an empty book for `instrument`.
    pub fn new(instrument: Instrument) -> OrderBook {
        OrderBook {
            instrument,
            orders: ObjectPool::new(),
            levels: ObjectPool::new(),
            bid_head: None,
            ask_head: None,
            bid_price_index: HashMap::with_capacity(LEVEL_POOL_CAPACITY),
            ask_price_index: HashMap::with_capacity(LEVEL_POOL_CAPACITY),
            order_index: HashMap::with_capacity(ORDER_POOL_CAPACITY),
            next_sequence: 0,
            last_trade_price: None,
            stats: BookStats::default(),
        }
    }

    /// The instrument this book tracks.
    #[inline]
    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Adds a new resting order, publishing an [`UpdateKind::OrderAdded`]
    /// event on success.
    pub fn add_order<const N: usize>(
        &mut self,
        order_id: u64,
        side: Side,
        order_type: OrderType,
        price: Price32nd,
        quantity: u64,
        timestamp_ns: u64,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
    ) -> Result<(), OrderBookError> {
        if order_id == 0 {
            return Err(OrderBookError::ZeroOrderId);
        }
        if quantity == 0 {
            return Err(OrderBookError::ZeroQuantity);
        }
        if self.order_index.contains_key(&order_id) {
            return Err(OrderBookError::DuplicateOrderId(order_id));
        }
        self.insert_order(order_id, side, order_type, price, quantity, timestamp_ns)?;
        self.stats.orders_added += 1;
        self.publish(updates, UpdateKind::OrderAdded, order_id, side, price, quantity, timestamp_ns);
        Ok(())
    }

    /// Cancels a resting order, publishing an [`UpdateKind::OrderCancelled`]
    /// event on success.
    pub fn cancel_order<const N: usize>(
        &mut self,
        order_id: u64,
        timestamp_ns: u64,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
    ) -> Result<(), OrderBookError> {
        let (side, price, quantity) = self.remove_order(order_id)?;
        self.stats.orders_cancelled += 1;
        self.publish(updates, UpdateKind::OrderCancelled, order_id, side, price, quantity, timestamp_ns);
        Ok(())
    }

    /// Modifies a resting order's price and/or quantity. Implemented as
    /// cancel-and-replace with a fresh arrival sequence: the order loses its
    /// prior time priority, even when only its quantity changes.
    pub fn modify_order<const N: usize>(
        &mut self,
        order_id: u64,
        new_price: Price32nd,
        new_quantity: u64,
        timestamp_ns: u64,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
    ) -> Result<(), OrderBookError> {
        if new_quantity == 0 {
            return Err(OrderBookError::ZeroQuantity);
        }
        let (side, order_type, _old_price, _old_quantity) = {
            let slot = *self
                .order_index
                .get(&order_id)
                .ok_or(OrderBookError::OrderNotFound(order_id))?;
            let order = self.orders.get(slot);
            (order.side, order.order_type, order.price, order.quantity)
        };
        self.remove_order(order_id)?;
        self.insert_order(order_id, side, order_type, new_price, new_quantity, timestamp_ns)?;
        self.stats.orders_modified += 1;
        self.publish(updates, UpdateKind::OrderModified, order_id, side, new_price, new_quantity, timestamp_ns);
        Ok(())
    }

    /// Applies a trade print of `quantity` at `price` against the resting
    /// side `side` (the side that was hit), consuming orders in strict FIFO
    /// order at the best level only. A trade that exceeds that level's
    /// liquidity stops once the level is empty; it never walks into the
    /// next level — callers simulate a deeper sweep with repeated calls.
    /// Used to keep a reconstructed book consistent with an external trade
    /// feed rather than to run the book's own matching.
    pub fn process_trade<const N: usize>(
        &mut self,
        side: Side,
        price: Price32nd,
        mut quantity: u64,
        timestamp_ns: u64,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
    ) {
        let Some(level_slot) = (match side {
            Side::Bid => self.bid_head,
            Side::Ask => self.ask_head,
        }) else {
            return;
        };
        let level_price = self.levels.get(level_slot).price;
        let level_is_through = match side {
            Side::Bid => level_price >= price,
            Side::Ask => level_price <= price,
        };
        if !level_is_through {
            return;
        }

        while quantity > 0 {
            let Some(front) = self.levels.get(level_slot).front() else {
                break;
            };
            let front_id = self.orders.get(front).order_id;
            let front_remaining = self.orders.get(front).remaining;
            let fill = front_remaining.min(quantity);

            self.levels.get_mut(level_slot).shrink_front(&self.orders, fill);
            quantity -= fill;
            self.stats.trades_executed += 1;
            self.stats.quantity_traded += fill;
            self.last_trade_price = Some(level_price);
            self.publish(updates, UpdateKind::TradeExecuted, front_id, side, level_price, fill, timestamp_ns);

            if self.orders.get(front).remaining == 0 {
                self.order_index.remove(&front_id);
                self.levels.get_mut(level_slot).remove(&self.orders, front);
                self.orders.release(front);
            }
        }

        if self.levels.get(level_slot).is_empty() {
            self.unlink_level(side, level_slot);
            match side {
                Side::Bid => self.bid_price_index.remove(&level_price),
                Side::Ask => self.ask_price_index.remove(&level_price),
            };
            self.levels.release(level_slot);
        }
    }

    /// The best (highest) resting bid price, or `None` if the bid side is empty.
    #[inline]
    pub fn get_best_bid(&self) -> Option<Price32nd> {
        self.bid_head.map(|s| self.levels.get(s).price)
    }

    /// The best (lowest) resting ask price, or `None` if the ask side is empty.
    #[inline]
    pub fn get_best_ask(&self) -> Option<Price32nd> {
        self.ask_head.map(|s| self.levels.get(s).price)
    }

    /// The last trade price applied via [`OrderBook::process_trade`], if any.
    #[inline]
    pub fn last_trade_price(&self) -> Option<Price32nd> {
        self.last_trade_price
    }

    /// Up to `depth` price levels on `side`, best-first, as
    /// `(price, aggregate_quantity)` pairs.
    pub fn get_market_depth(&self, side: Side, depth: usize) -> Vec<(Price32nd, u64)> {
        let mut out = Vec::with_capacity(depth.min(LEVEL_POOL_CAPACITY));
        let mut cursor = match side {
            Side::Bid => self.bid_head,
            Side::Ask => self.ask_head,
        };
        while let Some(slot) = cursor {
            if out.len() >= depth {
                break;
            }
            let level = self.levels.get(slot);
            out.push((level.price, level.total_quantity));
            cursor = level.next;
        }
        out
    }

    /// Running operation counters since the last [`OrderBook::reset`].
    #[inline]
    pub fn stats(&self) -> BookStats {
        self.stats
    }

    /// Clears every resting order and level, returning the book to its
    /// pristine, fully-available state.
    pub fn reset(&mut self) {
        self.orders.reset();
        self.levels.reset();
        self.bid_head = None;
        self.ask_head = None;
        self.bid_price_index.clear();
        self.ask_price_index.clear();
        self.order_index.clear();
        self.next_sequence = 0;
        self.last_trade_price = None;
        self.stats = BookStats::default();
    }

    fn insert_order(
        &mut self,
        order_id: u64,
        side: Side,
        order_type: OrderType,
        price: Price32nd,
        quantity: u64,
        timestamp_ns: u64,
    ) -> Result<(), OrderBookError> {
        let order_slot = self.orders.acquire().ok_or(OrderBookError::OrderPoolExhausted)?;
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let price_index = match side {
            Side::Bid => &self.bid_price_index,
            Side::Ask => &self.ask_price_index,
        };
        let level_slot = match price_index.get(&price).copied() {
            Some(existing) => existing,
            None => {
                let Some(new_level) = self.levels.acquire() else {
                    self.orders.release(order_slot);
                    return Err(OrderBookError::LevelPoolExhausted);
                };
                self.levels.write(new_level, PriceLevel::new(price));
                self.link_level(side, new_level);
                match side {
                    Side::Bid => self.bid_price_index.insert(price, new_level),
                    Side::Ask => self.ask_price_index.insert(price, new_level),
                };
                new_level
            }
        };

        self.orders.write(
            order_slot,
            Order::new(order_id, self.instrument, side, order_type, price, quantity, sequence, timestamp_ns),
        );
        self.levels.get_mut(level_slot).push_back(&self.orders, order_slot);
        self.order_index.insert(order_id, order_slot);
        Ok(())
    }

    fn remove_order(&mut self, order_id: u64) -> Result<(Side, Price32nd, u64), OrderBookError> {
        let order_slot = self
            .order_index
            .remove(&order_id)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        let (side, price, quantity) = {
            let order = self.orders.get(order_slot);
            (order.side, order.price, order.remaining)
        };
        let level_slot = *match side {
            Side::Bid => self.bid_price_index.get(&price),
            Side::Ask => self.ask_price_index.get(&price),
        }
        .expect("order's price level must exist while the order is resting");

        self.levels.get_mut(level_slot).remove(&self.orders, order_slot);
        self.orders.release(order_slot);

        if self.levels.get(level_slot).is_empty() {
            self.unlink_level(side, level_slot);
            match side {
                Side::Bid => self.bid_price_index.remove(&price),
                Side::Ask => self.ask_price_index.remove(&price),
            };
            self.levels.release(level_slot);
        }
        Ok((side, price, quantity))
    }

    fn link_level(&mut self, side: Side, slot: Slot<PriceLevel>) {
        let price = self.levels.get(slot).price;
        let mut cursor = match side {
            Side::Bid => self.bid_head,
            Side::Ask => self.ask_head,
        };
        let mut prev: Option<Slot<PriceLevel>> = None;
        while let Some(c) = cursor {
            let candidate_price = self.levels.get(c).price;
            let new_is_better = match side {
                Side::Bid => price > candidate_price,
                Side::Ask => price < candidate_price,
            };
            if new_is_better {
                break;
            }
            prev = Some(c);
            cursor = self.levels.get(c).next;
        }

        self.levels.get_mut(slot).prev = prev;
        self.levels.get_mut(slot).next = cursor;
        match prev {
            Some(p) => self.levels.get_mut(p).next = Some(slot),
            None => match side {
                Side::Bid => self.bid_head = Some(slot),
                Side::Ask => self.ask_head = Some(slot),
            },
        }
        if let Some(c) = cursor {
            self.levels.get_mut(c).prev = Some(slot);
        }
    }

    fn unlink_level(&mut self, side: Side, slot: Slot<PriceLevel>) {
        let prev = self.levels.get(slot).prev;
        let next = self.levels.get(slot).next;
        match prev {
            Some(p) => self.levels.get_mut(p).next = next,
            None => match side {
                Side::Bid => self.bid_head = next,
                Side::Ask => self.ask_head = next,
            },
        }
        if let Some(n) = next {
            self.levels.get_mut(n).prev = prev;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn publish<const N: usize>(
        &mut self,
        updates: &SpscRingBuffer<OrderBookUpdate, N>,
        kind: UpdateKind,
        order_id: u64,
        side: Side,
        price: Price32nd,
        quantity: u64,
        timestamp_ns: u64,
    ) {
        let update = OrderBookUpdate {
            kind,
            order_id,
            instrument: self.instrument,
            side,
            price,
            quantity,
            timestamp_ns,
        };
        // A full outbound ring never blocks the book: the update is dropped
        // and counted, book state itself is already committed above.
        if !updates.try_push(update) {
            self.stats.updates_dropped += 1;
            warn!(instrument = %self.instrument, kind = ?kind, "book update dropped, outbound ring full");
        }
    }
}
