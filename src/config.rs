//! Engine tunables.
//!
//! This crate has no CLI or file-loading layer of its own — wiring
//! `EngineConfig` from a `config`/`toml` file, environment variables, or a
//! CLI flag set is an external collaborator's job. What lives here is the
//! validated, typed shape those loaders fill in, with [`Default`] values
//! carried over from the reference market-making desk's existing constants.

use crate::instrument::{NUM_INSTRUMENTS, PerInstrument};
use serde::{Deserialize, Serialize};

/// Per-instrument DV01 (dollars of price change per basis point of yield,
/// per $1M notional), indexed by [`crate::instrument::Instrument::index`].
pub const DEFAULT_DV01_PER_MILLION: PerInstrument<f64> =
    [98.0, 196.0, 196.0, 472.0, 867.0, 1834.0];

/// Budgeted phase durations for the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseBudgets {
    /// Total budget for a single decision, nanoseconds.
    pub total_ns: u64,
    /// Phase 1 (essential analysis) budget, nanoseconds.
    pub essential_ns: u64,
    /// Phase 2 (enhanced analysis) budget, nanoseconds.
    pub enhanced_ns: u64,
    /// Phase 3 (quote generation) budget, nanoseconds.
    pub quote_ns: u64,
}

impl Default for PhaseBudgets {
    fn default() -> Self {
        PhaseBudgets {
            total_ns: 1_200,
            essential_ns: 400,
            enhanced_ns: 600,
            quote_ns: 200,
        }
    }
}

/// All tunables governing risk gates, quoting behaviour and phase budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base half-spread in basis points before inventory/enhancement adjustments.
    pub base_spread_bps: f64,
    /// Inventory skew penalty, in basis points per `inventory_scale` of position.
    pub inventory_penalty_bps: f64,
    /// Notional scale used to normalise position into an inventory-skew ratio.
    pub inventory_scale: f64,
    /// Base two-sided quote size before position scaling, in notional dollars.
    pub base_quote_size: u64,
    /// Absolute position cap (base currency notional); `|position| >= cap` forces CANCEL_QUOTES.
    pub position_cap: i64,
    /// Daily loss cap (positive number); `daily_pnl <= -cap` forces CANCEL_QUOTES.
    pub daily_loss_cap: f64,
    /// Maximum orders per instrument per day before quoting is halted.
    pub order_rate_cap: u64,
    /// Portfolio DV01 cap; proposed exposure beyond this shrinks or cancels the quote.
    pub dv01_cap: f64,
    /// Minimum quote size, in notional dollars.
    pub min_quote_size: u64,
    /// Maximum quote size, in notional dollars.
    pub max_quote_size: u64,
    /// Minimum bid/ask spread, in 32nds.
    pub min_spread_32nds: f64,
    /// Minimum price change (in 32nds) that justifies a quote update.
    pub price_update_threshold_32nds: f64,
    /// Minimum fractional size change that justifies a quote update.
    pub size_update_threshold: f64,
    /// Minimum nanoseconds between quote updates for a single instrument.
    pub quote_rate_limit_ns: u64,
    /// Book-imbalance price-adjustment coefficient (Phase 2).
    pub imbalance_coefficient: f64,
    /// Trade-flow momentum price-adjustment coefficient (Phase 2).
    pub momentum_coefficient: f64,
    /// Fair-curve mean-reversion coefficient (Phase 2); applied as a pull
    /// back toward the fair price, so effectively negative.
    pub fair_value_reversion_coefficient: f64,
    /// Nominal trading-session length in seconds, for inventory-penalty time decay.
    pub session_length_s: f64,
    /// Per-instrument DV01 table, dollars per basis point per $1M notional.
    pub dv01_per_million: PerInstrument<f64>,
    /// Budgeted phase durations.
    pub phase_budgets: PhaseBudgets,
    /// Minimum interval between portfolio-risk recomputations, nanoseconds.
    pub risk_refresh_interval_ns: u64,
    /// Advisory risk-score ceiling; not itself a hard gate.
    pub risk_score_advisory_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_spread_bps: 1.0,
            inventory_penalty_bps: 0.5,
            inventory_scale: 10_000_000.0,
            base_quote_size: 1_000_000,
            position_cap: 100_000_000,
            daily_loss_cap: 1_000_000.0,
            order_rate_cap: 1_000,
            dv01_cap: 50_000.0,
            min_quote_size: 100_000,
            max_quote_size: 50_000_000,
            min_spread_32nds: 1.0 / 32.0,
            price_update_threshold_32nds: 0.5 / 32.0,
            size_update_threshold: 0.1,
            quote_rate_limit_ns: 100_000_000,
            imbalance_coefficient: 0.25,
            momentum_coefficient: 0.1,
            fair_value_reversion_coefficient: 0.2,
            session_length_s: 8.0 * 3_600.0,
            dv01_per_million: DEFAULT_DV01_PER_MILLION,
            phase_budgets: PhaseBudgets::default(),
            risk_refresh_interval_ns: 1_000_000,
            risk_score_advisory_limit: 800,
        }
    }
}

impl EngineConfig {
    /// DV01 for `instrument` under this configuration.
    pub fn dv01_for(&self, instrument: crate::instrument::Instrument) -> f64 {
        self.dv01_per_million[instrument.index()]
    }
}

const _: () = assert!(NUM_INSTRUMENTS == 6, "DV01 table assumes six instruments");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_internally_consistent() {
        let cfg = EngineConfig::default();
        assert!(cfg.min_quote_size < cfg.max_quote_size);
        assert!(cfg.min_spread_32nds > 0.0);
        assert!(cfg.phase_budgets.essential_ns
            + cfg.phase_budgets.enhanced_ns
            + cfg.phase_budgets.quote_ns
            >= cfg.phase_budgets.total_ns);
    }
}
