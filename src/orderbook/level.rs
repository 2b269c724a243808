//! A single price level: a FIFO queue of resting orders.
//!
//! The queue is intrusive: orders link to each other via [`Slot<Order>`]
//! handles stored on the `Order` itself, so enqueue/dequeue/remove never
//! touch the heap. `PriceLevel` itself additionally carries `prev`/`next`
//! links to its neighbouring levels in the price ladder, forming a doubly
//! linked list ordered by price (ascending for asks, descending for bids is
//! imposed by the ladder, not by the level).

use crate::order::Order;
use crate::pool::{ObjectPool, Slot};
use crate::price::Price32nd;

/// One price point on a side of the book: an ordered FIFO of resting orders
/// plus links to its neighbours in the price ladder.
#[derive(Debug, Clone, Copy)]
pub struct PriceLevel {
    /// The price this level sits at.
    pub price: Price32nd,
    /// Sum of `remaining` across every order currently queued at this level.
    pub total_quantity: u64,
    /// Number of orders currently queued at this level.
    pub order_count: u32,
    head: Option<Slot<Order>>,
    tail: Option<Slot<Order>>,
    pub(crate) prev: Option<Slot<PriceLevel>>,
    pub(crate) next: Option<Slot<PriceLevel>>,
}

impl PriceLevel {
    /// Builds an empty level at `price`, with no ladder neighbours yet.
    pub fn new(price: Price32nd) -> PriceLevel {
        PriceLevel {
            price,
            total_quantity: 0,
            order_count: 0,
            head: None,
            tail: None,
            prev: None,
            next: None,
        }
    }

    /// `true` once the last resting order has been removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// The oldest (highest time-priority) order at this level, if any.
    #[inline]
    pub fn front(&self) -> Option<Slot<Order>> {
        self.head
    }

    /// Appends `order_slot` to the back of the FIFO, giving it the lowest
    /// time priority at this level. `orders` must be the pool that owns
    /// `order_slot`.
    pub fn push_back(&mut self, orders: &ObjectPool<Order, { crate::orderbook::ORDER_POOL_CAPACITY }>, order_slot: Slot<Order>) {
        let quantity = orders.get(order_slot).remaining;
        orders.get_mut(order_slot).prev = self.tail;
        orders.get_mut(order_slot).next = None;
        if let Some(tail) = self.tail {
            orders.get_mut(tail).next = Some(order_slot);
        } else {
            self.head = Some(order_slot);
        }
        self.tail = Some(order_slot);
        self.order_count += 1;
        self.total_quantity += quantity;
    }

    /// Removes `order_slot` from the FIFO in O(1), splicing its neighbours
    /// together. `order_slot` must currently belong to this level; removing
    /// a foreign slot corrupts the list.
    pub fn remove(&mut self, orders: &ObjectPool<Order, { crate::orderbook::ORDER_POOL_CAPACITY }>, order_slot: Slot<Order>) {
        let (prev, next, quantity) = {
            let order = orders.get(order_slot);
            (order.prev, order.next, order.remaining)
        };
        match prev {
            Some(p) => orders.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => orders.get_mut(n).prev = prev,
            None => self.tail = prev,
        }
        orders.get_mut(order_slot).prev = None;
        orders.get_mut(order_slot).next = None;
        self.order_count -= 1;
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
    }

    /// Reduces the front order's (and therefore the level's) resting
    /// quantity by `filled`, used when a trade partially executes the
    /// highest-priority order without removing it from the queue.
    pub fn shrink_front(&mut self, orders: &ObjectPool<Order, { crate::orderbook::ORDER_POOL_CAPACITY }>, filled: u64) {
        if let Some(front) = self.head {
            orders.get_mut(front).remaining = orders.get(front).remaining.saturating_sub(filled);
            self.total_quantity = self.total_quantity.saturating_sub(filled);
        }
    }

    /// Iterates the FIFO front-to-back, yielding each order's slot.
    pub fn iter<'a>(
        &self,
        orders: &'a ObjectPool<Order, { crate::orderbook::ORDER_POOL_CAPACITY }>,
    ) -> LevelIter<'a> {
        LevelIter {
            orders,
            next: self.head,
        }
    }
}

/// Front-to-back iterator over the orders resting at a [`PriceLevel`].
pub struct LevelIter<'a> {
    orders: &'a ObjectPool<Order, { crate::orderbook::ORDER_POOL_CAPACITY }>,
    next: Option<Slot<Order>>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = Slot<Order>;

    fn next(&mut self) -> Option<Slot<Order>> {
        let current = self.next?;
        self.next = self.orders.get(current).next;
        Some(current)
    }
}
