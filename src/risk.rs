//! Per-instrument and portfolio risk state.
//!
//! Every field the hot path touches is a plain atomic so a reader never
//! blocks a writer and vice versa. Floating-point accumulators (DV01, P&L)
//! use a compare-and-swap retry loop since there is no native atomic f64;
//! a monotonic version counter lets a reader detect it observed a torn
//! snapshot across several atomics and retry.

use crate::instrument::{Instrument, PerInstrument, NUM_INSTRUMENTS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};

#[inline]
fn cas_add_f64(cell: &AtomicU64, delta: f64) -> f64 {
    let mut current_bits = cell.load(Ordering::Relaxed);
    loop {
        let current = f64::from_bits(current_bits);
        let updated = current + delta;
        match cell.compare_exchange_weak(
            current_bits,
            updated.to_bits(),
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return updated,
            Err(observed) => current_bits = observed,
        }
    }
}

#[inline]
fn cas_set_f64(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Release);
}

#[inline]
fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Acquire))
}

/// Atomic, lock-free risk counters for a single instrument.
///
/// `#[repr(align(64))]` keeps each instrument's state on its own cache line
/// so concurrent updates to different instruments never false-share.
#[repr(align(64))]
pub struct InstrumentRiskState {
    position: AtomicI64,
    dv01_bits: AtomicU64,
    daily_pnl_bits: AtomicU64,
    var_bits: AtomicU64,
    order_count_today: AtomicU64,
    version: AtomicU64,
}

impl InstrumentRiskState {
    fn new() -> InstrumentRiskState {
        InstrumentRiskState {
            position: AtomicI64::new(0),
            dv01_bits: AtomicU64::new(0.0_f64.to_bits()),
            daily_pnl_bits: AtomicU64::new(0.0_f64.to_bits()),
            var_bits: AtomicU64::new(0.0_f64.to_bits()),
            order_count_today: AtomicU64::new(0),
            version: AtomicU64::new(0),
        }
    }

    /// Current position, base-currency notional, positive long.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }

    /// Current DV01 exposure for this instrument (dollars per basis point).
    #[inline]
    pub fn dv01(&self) -> f64 {
        load_f64(&self.dv01_bits)
    }

    /// Realized + mark-to-market P&L accumulated today.
    #[inline]
    pub fn daily_pnl(&self) -> f64 {
        load_f64(&self.daily_pnl_bits)
    }

    /// Most recently published value-at-risk estimate for this instrument.
    #[inline]
    pub fn value_at_risk(&self) -> f64 {
        load_f64(&self.var_bits)
    }

    /// Orders submitted against this instrument since the last daily reset.
    #[inline]
    pub fn order_count_today(&self) -> u64 {
        self.order_count_today.load(Ordering::Acquire)
    }

    /// Monotonic counter bumped on every mutating call; a reader that takes
    /// two snapshots with the same version observed a consistent read.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl Default for InstrumentRiskState {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate portfolio-level risk, refreshed no more often than
/// [`crate::config::EngineConfig::risk_refresh_interval_ns`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRisk {
    /// Sum of per-instrument DV01, signed.
    pub total_dv01: f64,
    /// Sum of today's realized + mark-to-market P&L across instruments.
    pub total_daily_pnl: f64,
    /// Portfolio value-at-risk estimate.
    pub portfolio_var: f64,
    /// Advisory composite risk score, clamped to `0..=1000`.
    pub risk_score: u32,
}

/// Owns every instrument's [`InstrumentRiskState`] plus the last computed
/// portfolio-level aggregate.
pub struct RiskState {
    per_instrument: PerInstrument<InstrumentRiskState>,
    last_refresh_ns: AtomicU64,
    portfolio_risk_score: AtomicU32,
}

impl RiskState {
    /// Builds a zeroed risk state for all instruments.
    pub fn new() -> RiskState {
        RiskState {
            per_instrument: std::array::from_fn(|_| InstrumentRiskState::new()),
            last_refresh_ns: AtomicU64::new(0),
            portfolio_risk_score: AtomicU32::new(0),
        }
    }

    /// Read access to a single instrument's risk counters.
    #[inline]
    pub fn instrument(&self, instrument: Instrument) -> &InstrumentRiskState {
        &self.per_instrument[instrument.index()]
    }

    /// Applies a fill of `signed_quantity` (positive = bought, negative =
    /// sold) at `dv01_per_million` per $1M notional, updating position and
    /// DV01 atomically via CAS. Returns the new position.
    pub fn update_position(&self, instrument: Instrument, signed_quantity: i64, dv01_per_million: f64) -> i64 {
        let state = self.instrument(instrument);
        let new_position = state.position.fetch_add(signed_quantity, Ordering::AcqRel) + signed_quantity;
        let dv01_delta = (signed_quantity as f64 / 1_000_000.0) * dv01_per_million;
        cas_add_f64(&state.dv01_bits, dv01_delta);
        state.version.fetch_add(1, Ordering::AcqRel);
        new_position
    }

    /// Records `pnl_delta` against an instrument's running daily P&L.
    pub fn update_pnl(&self, instrument: Instrument, pnl_delta: f64) -> f64 {
        let state = self.instrument(instrument);
        let updated = cas_add_f64(&state.daily_pnl_bits, pnl_delta);
        state.version.fetch_add(1, Ordering::AcqRel);
        updated
    }

    /// Replaces an instrument's last-published value-at-risk estimate.
    pub fn set_value_at_risk(&self, instrument: Instrument, var: f64) {
        let state = self.instrument(instrument);
        cas_set_f64(&state.var_bits, var);
        state.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Increments an instrument's daily order counter, returning the new count.
    pub fn record_order(&self, instrument: Instrument) -> u64 {
        self.instrument(instrument).order_count_today.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Sum of every instrument's current DV01, not rate-limited: cheap enough
    /// to call from the decision hot path, unlike [`RiskState::refresh_portfolio_risk`].
    #[inline]
    pub fn total_dv01(&self) -> f64 {
        self.per_instrument.iter().map(|state| state.dv01()).sum()
    }

    /// Recomputes the portfolio aggregate if at least
    /// `min_interval_ns` has elapsed since the last refresh (`now_ns` is the
    /// caller-supplied clock reading). Returns `None` if the refresh was
    /// skipped as too soon.
    pub fn refresh_portfolio_risk(
        &self,
        now_ns: u64,
        min_interval_ns: u64,
        position_cap: i64,
        daily_loss_cap: f64,
    ) -> Option<PortfolioRisk> {
        let last = self.last_refresh_ns.load(Ordering::Acquire);
        if now_ns.saturating_sub(last) < min_interval_ns {
            return None;
        }
        if self
            .last_refresh_ns
            .compare_exchange(last, now_ns, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }

        let mut total_dv01 = 0.0;
        let mut total_daily_pnl = 0.0;
        let mut portfolio_var = 0.0;
        let mut worst_position_ratio = 0.0_f64;
        for state in &self.per_instrument {
            total_dv01 += state.dv01();
            total_daily_pnl += state.daily_pnl();
            portfolio_var += state.value_at_risk();
            let ratio = (state.position() as f64 / position_cap.max(1) as f64).abs();
            worst_position_ratio = worst_position_ratio.max(ratio);
        }

        let loss_ratio = (-total_daily_pnl / daily_loss_cap.max(1.0)).clamp(0.0, 1.0);
        let concentration_penalty = worst_position_ratio.clamp(0.0, 1.0);
        // Weighted blend of position utilisation, realized-loss utilisation
        // and single-instrument concentration, clamped to the advisory
        // 0..=1000 scale.
        let score = (worst_position_ratio * 400.0 + loss_ratio * 400.0 + concentration_penalty * 200.0)
            .clamp(0.0, 1000.0) as u32;
        self.portfolio_risk_score.store(score, Ordering::Release);

        Some(PortfolioRisk {
            total_dv01,
            total_daily_pnl,
            portfolio_var,
            risk_score: score,
        })
    }

    /// The most recently computed advisory risk score, or `0` before the
    /// first refresh.
    #[inline]
    pub fn risk_score(&self) -> u32 {
        self.portfolio_risk_score.load(Ordering::Acquire)
    }

    /// Resets every instrument's counters to zero (start-of-day rollover).
    pub fn reset_daily(&self) {
        for state in &self.per_instrument {
            state.position.store(0, Ordering::Release);
            cas_set_f64(&state.dv01_bits, 0.0);
            cas_set_f64(&state.daily_pnl_bits, 0.0);
            cas_set_f64(&state.var_bits, 0.0);
            state.order_count_today.store(0, Ordering::Release);
            state.version.fetch_add(1, Ordering::AcqRel);
        }
        self.last_refresh_ns.store(0, Ordering::Release);
        self.portfolio_risk_score.store(0, Ordering::Release);
    }
}

impl Default for RiskState {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(NUM_INSTRUMENTS == 6, "risk state assumes six instruments");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_and_dv01_update_together() {
        let risk = RiskState::new();
        let new_pos = risk.update_position(Instrument::Note10Y, 2_000_000, 867.0);
        assert_eq!(new_pos, 2_000_000);
        assert!((risk.instrument(Instrument::Note10Y).dv01() - 1_734.0).abs() < 1e-6);
    }

    #[test]
    fn pnl_accumulates_across_calls() {
        let risk = RiskState::new();
        risk.update_pnl(Instrument::Note5Y, 1_500.0);
        risk.update_pnl(Instrument::Note5Y, -200.0);
        assert!((risk.instrument(Instrument::Note5Y).daily_pnl() - 1_300.0).abs() < 1e-6);
    }

    #[test]
    fn version_advances_on_every_mutation() {
        let risk = RiskState::new();
        let before = risk.instrument(Instrument::Bill3M).version();
        risk.update_pnl(Instrument::Bill3M, 1.0);
        assert!(risk.instrument(Instrument::Bill3M).version() > before);
    }

    #[test]
    fn refresh_is_rate_limited() {
        let risk = RiskState::new();
        let first = risk.refresh_portfolio_risk(1_000_000, 1_000_000, 100_000_000, 1_000_000.0);
        assert!(first.is_some());
        let second = risk.refresh_portfolio_risk(1_500_000, 1_000_000, 100_000_000, 1_000_000.0);
        assert!(second.is_none());
        let third = risk.refresh_portfolio_risk(2_000_001, 1_000_000, 100_000_000, 1_000_000.0);
        assert!(third.is_some());
    }

    #[test]
    fn risk_score_rises_with_position_utilisation() {
        let risk = RiskState::new();
        risk.update_position(Instrument::Note10Y, 90_000_000, 867.0);
        let snapshot = risk.refresh_portfolio_risk(10, 1, 100_000_000, 1_000_000.0).unwrap();
        assert!(snapshot.risk_score > 300);
    }

    #[test]
    fn reset_daily_zeroes_every_instrument() {
        let risk = RiskState::new();
        risk.update_position(Instrument::Bond30Y, 10_000_000, 1834.0);
        risk.update_pnl(Instrument::Bond30Y, 500.0);
        risk.reset_daily();
        assert_eq!(risk.instrument(Instrument::Bond30Y).position(), 0);
        assert_eq!(risk.instrument(Instrument::Bond30Y).dv01(), 0.0);
        assert_eq!(risk.instrument(Instrument::Bond30Y).daily_pnl(), 0.0);
    }
}
