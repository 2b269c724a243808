//! Order and side/type enums.

use crate::instrument::Instrument;
use crate::pool::Slot;
use crate::price::Price32nd;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side.
    Bid = 0,
    /// Sell side.
    Ask = 1,
}

impl Side {
    /// The opposite side.
    #[inline]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Bid => "BID",
            Side::Ask => "ASK",
        })
    }
}

/// Order execution style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    /// Resting limit order.
    Limit = 0,
    /// Immediate-execution market order.
    Market = 1,
}

/// A resting order, as stored in the book's order pool.
///
/// `prev`/`next` are the intrusive FIFO links within the owning
/// [`crate::orderbook::level::PriceLevel`] — `(pool, index)` handles rather
/// than raw pointers, per the design notes on expressing intrusive lists in
/// a language without raw aliasing.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    /// Unique, non-zero order identifier.
    pub order_id: u64,
    /// The instrument this order is quoted on.
    pub instrument: Instrument,
    /// Which side of the book the order rests on.
    pub side: Side,
    /// Limit or market.
    pub order_type: OrderType,
    /// Limit price (ignored for market orders beyond matching direction).
    pub price: Price32nd,
    /// Quantity at submission time.
    pub quantity: u64,
    /// Unfilled quantity remaining; invariant `0 < remaining <= quantity`.
    pub remaining: u64,
    /// Monotonic arrival sequence, used for FIFO time priority.
    pub sequence: u64,
    /// Creation timestamp in nanoseconds, caller-supplied clock.
    pub timestamp_ns: u64,
    pub(crate) prev: Option<Slot<Order>>,
    pub(crate) next: Option<Slot<Order>>,
}

impl Order {
    /// Constructs a new order with fresh FIFO links and `remaining ==
    /// quantity`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: u64,
        instrument: Instrument,
        side: Side,
        order_type: OrderType,
        price: Price32nd,
        quantity: u64,
        sequence: u64,
        timestamp_ns: u64,
    ) -> Order {
        Order {
            order_id,
            instrument,
            side,
            order_type,
            price,
            quantity,
            remaining: quantity,
            sequence,
            timestamp_ns,
            prev: None,
            next: None,
        }
    }

    /// `true` once the order has no unfilled quantity left.
    #[inline]
    pub const fn is_filled(&self) -> bool {
        self.remaining == 0
    }
}
