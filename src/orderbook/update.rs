//! Book-change events published to the outbound [`crate::ring_buffer::SpscRingBuffer`].

use crate::instrument::Instrument;
use crate::order::Side;
use crate::price::Price32nd;

/// The kind of mutation an [`OrderBookUpdate`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateKind {
    /// A new order was added to the book.
    OrderAdded = 0,
    /// A resting order was cancelled.
    OrderCancelled = 1,
    /// A resting order was modified (cancel-and-replace; ).
    OrderModified = 2,
    /// A trade executed against one or more resting orders.
    TradeExecuted = 3,
    /// A price level's aggregate quantity changed without an order count change.
    LevelUpdated = 4,
}

/// A single book-change event.
///
/// This is the in-process representation consumed by strategy/book-keeping
/// collaborators; [`WireOrderBookUpdate`] is the fixed 48-byte on-the-wire
/// form used when the `wire` feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBookUpdate {
    /// What happened.
    pub kind: UpdateKind,
    /// The order id involved, or `0` for level-only updates.
    pub order_id: u64,
    /// Which instrument's book changed.
    pub instrument: Instrument,
    /// Which side of the book changed.
    pub side: Side,
    /// The price level involved.
    pub price: Price32nd,
    /// Quantity relevant to the event (order size, trade size, or new level total).
    pub quantity: u64,
    /// Caller-supplied clock reading at the time of the mutation.
    pub timestamp_ns: u64,
}

#[cfg(feature = "wire")]
pub use wire::WireOrderBookUpdate;

#[cfg(feature = "wire")]
mod wire {
    use super::{OrderBookUpdate, UpdateKind};
    use crate::instrument::Instrument;
    use crate::order::Side;
    use crate::price::Price32nd;
    use zerocopy::{Immutable, IntoBytes, FromBytes, KnownLayout};

    /// Fixed 48-byte little-endian wire record for [`OrderBookUpdate`],
    /// matching the layout used by downstream market-data consumers:
    /// `update_type(1) + pad(7) + order_id(8) + instrument(1) + side(1) +
    /// pad(6) + price(8) + quantity(8) + timestamp_ns(8)`.
    #[repr(C)]
    #[derive(Debug, Clone, Copy, IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub struct WireOrderBookUpdate {
        update_type: u8,
        _pad0: [u8; 7],
        order_id: u64,
        instrument: u8,
        side: u8,
        _pad1: [u8; 6],
        price_whole: u32,
        price_32nds: u8,
        price_half: u8,
        _pad2: [u8; 2],
        quantity: u64,
        timestamp_ns: u64,
    }

    const _: () = assert!(std::mem::size_of::<WireOrderBookUpdate>() == 48);

    impl From<OrderBookUpdate> for WireOrderBookUpdate {
        fn from(update: OrderBookUpdate) -> Self {
            WireOrderBookUpdate {
                update_type: update.kind as u8,
                _pad0: [0; 7],
                order_id: update.order_id,
                instrument: update.instrument as u8,
                side: update.side as u8,
                _pad1: [0; 6],
                price_whole: update.price.whole,
                price_32nds: update.price.thirty_seconds,
                price_half: update.price.half_32nds,
                _pad2: [0; 2],
                quantity: update.quantity,
                timestamp_ns: update.timestamp_ns,
            }
        }
    }

    impl WireOrderBookUpdate {
        /// Decodes back into the in-process representation, or `None` if the
        /// kind/instrument/side byte values are out of range.
        pub fn decode(self) -> Option<OrderBookUpdate> {
            let kind = match self.update_type {
                0 => UpdateKind::OrderAdded,
                1 => UpdateKind::OrderCancelled,
                2 => UpdateKind::OrderModified,
                3 => UpdateKind::TradeExecuted,
                4 => UpdateKind::LevelUpdated,
                _ => return None,
            };
            let instrument = Instrument::from_index(self.instrument as usize)?;
            let side = match self.side {
                0 => Side::Bid,
                1 => Side::Ask,
                _ => return None,
            };
            Some(OrderBookUpdate {
                kind,
                order_id: self.order_id,
                instrument,
                side,
                price: Price32nd {
                    whole: self.price_whole,
                    thirty_seconds: self.price_32nds,
                    half_32nds: self.price_half,
                },
                quantity: self.quantity,
                timestamp_ns: self.timestamp_ns,
            })
        }
    }

}
