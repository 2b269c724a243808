//! Optional acquire/release latency histograms.

use hdrhistogram::Histogram;
use std::time::Instant;

/// Nanosecond latency histograms for pool `acquire`/`release` calls.
/// Only compiled in when the `timed` feature is enabled; recording never
/// changes pool semantics, only observability.
pub struct PoolLatencyHistograms {
    acquire_ns: Histogram<u64>,
    release_ns: Histogram<u64>,
}

impl PoolLatencyHistograms {
    pub(super) fn new() -> Self {
        PoolLatencyHistograms {
            acquire_ns: Histogram::new(3).expect("valid histogram parameters"),
            release_ns: Histogram::new(3).expect("valid histogram parameters"),
        }
    }

    pub(super) fn record_acquire(&mut self, elapsed: std::time::Duration) {
        let _ = self.acquire_ns.record(elapsed.as_nanos() as u64);
    }

    pub(super) fn record_release(&mut self, elapsed: std::time::Duration) {
        let _ = self.release_ns.record(elapsed.as_nanos() as u64);
    }

    /// Read-only view of the `acquire` latency histogram.
    pub fn acquire_histogram(&self) -> &Histogram<u64> {
        &self.acquire_ns
    }

    /// Read-only view of the `release` latency histogram.
    pub fn release_histogram(&self) -> &Histogram<u64> {
        &self.release_ns
    }
}

pub(super) fn now() -> Instant {
    Instant::now()
}
