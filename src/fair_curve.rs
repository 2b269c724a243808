//! Per-instrument fair-value curve snapshot: the external
//! pricing model's view of fair yield/price, published for the decision
//! engine's mean-reversion term to read without locking.

use crate::instrument::{Instrument, PerInstrument, NUM_INSTRUMENTS};
use crate::price::Price32nd;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[inline]
fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Acquire))
}

#[inline]
fn store_f64(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Release);
}

/// One instrument's fair-value snapshot: yield, decimal price, and an
/// implied-volatility estimate, each independently atomic.
#[repr(align(64))]
pub struct FairCurveEntry {
    yield_bps: AtomicU64,
    fair_price_bits: AtomicU64,
    implied_vol_bits: AtomicU64,
    valid: AtomicBool,
    updated_at_ns: AtomicU64,
}

impl FairCurveEntry {
    fn new() -> FairCurveEntry {
        FairCurveEntry {
            yield_bps: AtomicU64::new(0.0_f64.to_bits()),
            fair_price_bits: AtomicU64::new(0.0_f64.to_bits()),
            implied_vol_bits: AtomicU64::new(0.0_f64.to_bits()),
            valid: AtomicBool::new(false),
            updated_at_ns: AtomicU64::new(0),
        }
    }

    /// Fair yield in basis points.
    #[inline]
    pub fn yield_bps(&self) -> f64 {
        load_f64(&self.yield_bps)
    }

    /// Fair decimal price, derived from the yield by the publishing model.
    #[inline]
    pub fn fair_price(&self) -> f64 {
        load_f64(&self.fair_price_bits)
    }

    /// Annualised implied volatility estimate.
    #[inline]
    pub fn implied_vol(&self) -> f64 {
        load_f64(&self.implied_vol_bits)
    }

    /// `false` before the first publish, or after [`FairCurveSnapshot::invalidate`].
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Clock reading at the last publish.
    #[inline]
    pub fn updated_at_ns(&self) -> u64 {
        self.updated_at_ns.load(Ordering::Acquire)
    }

    /// Fair price expressed on the 32nd grid.
    pub fn fair_price_32nd(&self) -> Price32nd {
        Price32nd::from_decimal(self.fair_price())
    }
}

impl Default for FairCurveEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-free, per-instrument fair-value curve. One producer (the pricing
/// model) publishes; any number of readers (decision engine instances) may
/// read concurrently.
pub struct FairCurveSnapshot {
    entries: PerInstrument<FairCurveEntry>,
}

impl FairCurveSnapshot {
    /// Builds a snapshot with every instrument marked invalid.
    pub fn new() -> FairCurveSnapshot {
        FairCurveSnapshot {
            entries: std::array::from_fn(|_| FairCurveEntry::new()),
        }
    }

    /// Read access to an instrument's fair-value entry.
    #[inline]
    pub fn entry(&self, instrument: Instrument) -> &FairCurveEntry {
        &self.entries[instrument.index()]
    }

    /// Publishes a new fair yield/price/vol for `instrument`, marking it valid.
    pub fn publish(&self, instrument: Instrument, yield_bps: f64, fair_price: f64, implied_vol: f64, now_ns: u64) {
        let entry = &self.entries[instrument.index()];
        store_f64(&entry.yield_bps, yield_bps);
        store_f64(&entry.fair_price_bits, fair_price);
        store_f64(&entry.implied_vol_bits, implied_vol);
        entry.updated_at_ns.store(now_ns, Ordering::Release);
        entry.valid.store(true, Ordering::Release);
    }

    /// Marks `instrument`'s entry invalid, e.g. on a stale or rejected feed.
    pub fn invalidate(&self, instrument: Instrument) {
        self.entries[instrument.index()].valid.store(false, Ordering::Release);
    }
}

impl Default for FairCurveSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(NUM_INSTRUMENTS == 6, "fair curve snapshot assumes six instruments");
