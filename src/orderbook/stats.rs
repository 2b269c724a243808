//! Aggregate counters returned by [`super::book::OrderBook::stats`].

use serde::{Deserialize, Serialize};

/// Running counters for a single instrument's book, reset only by
/// [`super::book::OrderBook::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStats {
    /// Total orders ever added.
    pub orders_added: u64,
    /// Total orders cancelled.
    pub orders_cancelled: u64,
    /// Total orders modified (cancel-and-replace).
    pub orders_modified: u64,
    /// Total trades executed against resting orders.
    pub trades_executed: u64,
    /// Total quantity traded.
    pub quantity_traded: u64,
    /// Number of book updates dropped because the outbound ring buffer was full.
    pub updates_dropped: u64,
}
