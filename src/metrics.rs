//! Ambient counters for operational visibility; the ladder/decision/quote
//! logic itself never reads these.
//!
//! Plain atomics always track the counts; when the `metrics` feature is
//! enabled, every increment is also forwarded to the `metrics` crate's
//! global recorder so this binary can plug into whatever exporter the
//! embedding application already runs (Prometheus, StatsD, ...).

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters for the decision/quote/book pipeline.
#[derive(Default)]
pub struct EngineMetrics {
    decisions_total: AtomicU64,
    quote_updates: AtomicU64,
    quote_cancels: AtomicU64,
    emergency_flattens: AtomicU64,
    quote_validation_rejections: AtomicU64,
    book_updates_dropped: AtomicU64,
}

impl EngineMetrics {
    /// A zeroed counter set.
    pub fn new() -> EngineMetrics {
        EngineMetrics::default()
    }

    /// Records one [`crate::decision::DecisionEngine::decide`] call and its outcome.
    pub fn record_decision(&self, action: crate::decision::DecisionAction) {
        self.decisions_total.fetch_add(1, Ordering::Relaxed);
        match action {
            crate::decision::DecisionAction::UpdateQuotes => {
                self.quote_updates.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                ::metrics::counter!("treasury_mm_quote_updates_total").increment(1);
            }
            crate::decision::DecisionAction::CancelQuotes => {
                self.quote_cancels.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                ::metrics::counter!("treasury_mm_quote_cancels_total").increment(1);
            }
            crate::decision::DecisionAction::EmergencyFlatten => {
                self.emergency_flattens.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                ::metrics::counter!("treasury_mm_emergency_flattens_total").increment(1);
            }
            crate::decision::DecisionAction::NoAction => {}
        }
        #[cfg(feature = "metrics")]
        ::metrics::counter!("treasury_mm_decisions_total").increment(1);
    }

    /// Records a rejected [`crate::quote_manager::QuoteManager::validate_quote`] call.
    pub fn record_quote_rejection(&self) {
        self.quote_validation_rejections.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::counter!("treasury_mm_quote_rejections_total").increment(1);
    }

    /// Records a book update dropped because its outbound ring was full.
    pub fn record_book_update_dropped(&self) {
        self.book_updates_dropped.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::counter!("treasury_mm_book_updates_dropped_total").increment(1);
    }

    /// Total decisions made since construction.
    pub fn decisions_total(&self) -> u64 {
        self.decisions_total.load(Ordering::Relaxed)
    }

    /// Total quote updates placed since construction.
    pub fn quote_updates(&self) -> u64 {
        self.quote_updates.load(Ordering::Relaxed)
    }

    /// Total emergency flattens triggered since construction.
    pub fn emergency_flattens(&self) -> u64 {
        self.emergency_flattens.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionAction;

    #[test]
    fn counters_increment_per_action() {
        let metrics = EngineMetrics::new();
        metrics.record_decision(DecisionAction::UpdateQuotes);
        metrics.record_decision(DecisionAction::EmergencyFlatten);
        metrics.record_decision(DecisionAction::NoAction);
        assert_eq!(metrics.decisions_total(), 3);
        assert_eq!(metrics.quote_updates(), 1);
        assert_eq!(metrics.emergency_flattens(), 1);
    }
}
