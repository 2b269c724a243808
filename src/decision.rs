//! Three-phase budgeted market-making decision pipeline.
//!
//! Each call to [`DecisionEngine::decide`] is a "goto-finalize" pipeline:
//! Phase 1 (essential) computes a risk-gated baseline quote; Phase 2
//! (enhanced) layers on book-imbalance, trade-momentum and fair-value
//! mean-reversion adjustments *only if time remains in its budget*; Phase 3
//! (finalize) always runs, applies the DV01 cap and snaps prices to the
//! 32nd grid. A phase that runs out of budget jumps straight to finalize
//! with whatever adjustments are already computed, rather than blocking for
//! a "complete" answer. Determinism means the same inputs at the same
//! engine state always produce the same decision, not that every phase
//! always runs to completion.

use crate::config::EngineConfig;
use crate::fair_curve::FairCurveSnapshot;
use crate::instrument::{Instrument, PerInstrument};
use crate::price::Price32nd;
use crate::risk::RiskState;
use std::cell::Cell;
use std::time::Instant;
use tracing::warn;

/// What the engine decided to do with an instrument's quote this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    /// Nothing changed enough to act on.
    NoAction,
    /// Place or replace a two-sided quote at the given price/size.
    UpdateQuotes,
    /// Pull the resting quote without replacing it.
    CancelQuotes,
    /// Risk limits are breached badly enough to flatten the position and
    /// stop quoting entirely.
    EmergencyFlatten,
}

/// A single instrument's L1 market snapshot, as fed into [`DecisionEngine::decide`].
#[derive(Debug, Clone, Copy)]
pub struct MarketUpdate {
    /// The instrument this snapshot describes.
    pub instrument: Instrument,
    /// Best resting bid price.
    pub best_bid: Price32nd,
    /// Best resting ask price.
    pub best_ask: Price32nd,
    /// Aggregate quantity resting at the best bid.
    pub bid_depth: u64,
    /// Aggregate quantity resting at the best ask.
    pub ask_depth: u64,
    /// Signed quantity of the most recent trade print: positive for a
    /// buy-side aggressor, negative for a sell-side aggressor, zero if none
    /// occurred since the last update.
    pub last_trade_signed_quantity: i64,
    /// Caller-supplied clock reading.
    pub timestamp_ns: u64,
}

/// The engine's output for one [`MarketUpdate`].
#[derive(Debug, Clone, Copy)]
pub struct TradingDecision {
    /// The instrument this decision applies to.
    pub instrument: Instrument,
    /// What to do.
    pub action: DecisionAction,
    /// Proposed bid price, meaningful only when `action == UpdateQuotes`.
    pub bid_price: Price32nd,
    /// Proposed ask price, meaningful only when `action == UpdateQuotes`.
    pub ask_price: Price32nd,
    /// Proposed bid size, meaningful only when `action == UpdateQuotes`.
    pub bid_size: u64,
    /// Proposed ask size, meaningful only when `action == UpdateQuotes`.
    pub ask_size: u64,
    /// How many phases ran before finalize (1, 2, or 3).
    pub phases_completed: u8,
    /// Wall-clock nanoseconds the decision took.
    pub decision_latency_ns: u64,
}

impl TradingDecision {
    fn no_action(instrument: Instrument, phases_completed: u8, decision_latency_ns: u64) -> TradingDecision {
        TradingDecision {
            instrument,
            action: DecisionAction::NoAction,
            bid_price: Price32nd::ZERO,
            ask_price: Price32nd::ZERO,
            bid_size: 0,
            ask_size: 0,
            phases_completed,
            decision_latency_ns,
        }
    }

    fn cancel(instrument: Instrument, phases_completed: u8, decision_latency_ns: u64) -> TradingDecision {
        TradingDecision {
            action: DecisionAction::CancelQuotes,
            ..TradingDecision::no_action(instrument, phases_completed, decision_latency_ns)
        }
    }
}

struct EssentialResult {
    center_price: f64,
    spread_bps: f64,
    inventory_ratio: f64,
}

/// Runs the budgeted decision pipeline for each instrument.
///
/// Holds a per-instrument exponential moving average of recent signed trade
/// flow (Phase 2's momentum term), the remaining-session clock used by the
/// time-decayed inventory penalty, and the last quote posted per instrument
/// (Phase 3's change-threshold baseline).
pub struct DecisionEngine {
    config: EngineConfig,
    momentum_ema: PerInstrument<Cell<f64>>,
    time_to_close_s: Cell<f64>,
    last_quote: PerInstrument<Cell<(f64, f64)>>,
}

impl DecisionEngine {
    /// Builds a decision engine with zeroed momentum and a full session
    /// remaining (no time-decay penalty until [`DecisionEngine::set_time_to_close`]
    /// is called).
    pub fn new(config: EngineConfig) -> DecisionEngine {
        let session_length = config.session_length_s;
        DecisionEngine {
            config,
            momentum_ema: std::array::from_fn(|_| Cell::new(0.0)),
            time_to_close_s: Cell::new(session_length),
            last_quote: std::array::from_fn(|_| Cell::new((0.0, 0.0))),
        }
    }

    /// The configuration this engine is running with.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Updates the remaining-session clock used by the inventory time-decay term.
    pub fn set_time_to_close(&self, seconds_remaining: f64) {
        self.time_to_close_s.set(seconds_remaining.max(0.0));
    }

    /// Folds a trade print into the instrument's momentum estimate.
    pub fn observe_trade(&self, instrument: Instrument, signed_quantity: i64) {
        const ALPHA: f64 = 0.2;
        let cell = &self.momentum_ema[instrument.index()];
        cell.set(cell.get() * (1.0 - ALPHA) + signed_quantity as f64 * ALPHA);
    }

    /// Runs the full three-phase pipeline for `update`, consulting `risk`
    /// for position/loss/DV01 gates and `fair_curve` for the mean-reversion term.
    pub fn decide(&self, update: &MarketUpdate, risk: &RiskState, fair_curve: &FairCurveSnapshot) -> TradingDecision {
        let start = Instant::now();
        let budgets = self.config.phase_budgets;
        let instrument = update.instrument;
        let instrument_risk = risk.instrument(instrument);

        // Phase 1: essential risk gates and baseline quote.
        let position = instrument_risk.position();
        if position.unsigned_abs() as i64 >= self.config.position_cap {
            warn!(instrument = %instrument, position, cap = self.config.position_cap, "position cap breached, cancelling quotes");
            return TradingDecision::cancel(instrument, 1, start.elapsed().as_nanos() as u64);
        }
        if instrument_risk.daily_pnl() <= -self.config.daily_loss_cap {
            return TradingDecision::cancel(instrument, 1, start.elapsed().as_nanos() as u64);
        }
        if instrument_risk.order_count_today() >= self.config.order_rate_cap {
            return TradingDecision::cancel(instrument, 1, start.elapsed().as_nanos() as u64);
        }

        let mid = (update.best_bid.to_decimal() + update.best_ask.to_decimal()) / 2.0;
        let inventory_ratio = position as f64 / self.config.inventory_scale;
        let essential = EssentialResult {
            center_price: mid - inventory_ratio * self.config.inventory_penalty_bps * mid / 10_000.0,
            spread_bps: self.config.base_spread_bps,
            inventory_ratio,
        };

        if start.elapsed().as_nanos() as u64 >= budgets.essential_ns {
            return self.finalize(update, risk, &essential, start, 1);
        }

        // Phase 2: enhanced adjustments, time permitting.
        let total_depth = update.bid_depth + update.ask_depth;
        let bid_imbalance = if total_depth > 0 {
            update.bid_depth as f64 / total_depth as f64
        } else {
            0.5
        };
        let imbalance_shift_bps = (bid_imbalance - 0.5) * self.config.imbalance_coefficient;

        self.observe_trade(instrument, update.last_trade_signed_quantity);
        let momentum_shift_bps = self.momentum_ema[instrument.index()].get() / self.config.inventory_scale
            * self.config.momentum_coefficient
            * 10_000.0;

        let fair_entry = fair_curve.entry(instrument);
        let reversion_pull = if fair_entry.is_valid() {
            (fair_entry.fair_price() - mid) * self.config.fair_value_reversion_coefficient
        } else {
            0.0
        };

        let decay_factor = (self.time_to_close_s.get() / self.config.session_length_s).clamp(0.1, 1.0);
        let decayed_center = mid
            - inventory_ratio * self.config.inventory_penalty_bps * mid / 10_000.0 * decay_factor;

        let enhanced = EssentialResult {
            center_price: decayed_center
                + mid * (imbalance_shift_bps + momentum_shift_bps) / 10_000.0
                + reversion_pull,
            spread_bps: essential.spread_bps,
            inventory_ratio,
        };

        if start.elapsed().as_nanos() as u64 >= budgets.essential_ns + budgets.enhanced_ns {
            return self.finalize(update, risk, &enhanced, start, 2);
        }

        self.finalize(update, risk, &enhanced, start, 3)
    }

    fn finalize(
        &self,
        update: &MarketUpdate,
        risk: &RiskState,
        result: &EssentialResult,
        start: Instant,
        phases_completed: u8,
    ) -> TradingDecision {
        let instrument = update.instrument;
        let half_spread = result.center_price * result.spread_bps / 10_000.0 / 2.0;
        let bid_price = Price32nd::from_decimal_round_down(result.center_price - half_spread);
        let ask_price = Price32nd::from_decimal_round_up(result.center_price + half_spread);

        let size_scale = (1.0 - result.inventory_ratio.abs()).clamp(0.1, 1.0);
        let proposed_size = ((self.config.base_quote_size as f64) * size_scale) as u64;
        let mut size = proposed_size.clamp(self.config.min_quote_size, self.config.max_quote_size);

        // DV01 check: shrink the proposed size proportionally if adding it to
        // the portfolio's current exposure would breach the cap; cancel
        // outright if the surviving size would be negligible.
        let dv01_per_million = self.config.dv01_for(instrument);
        let portfolio_dv01 = risk.total_dv01();
        let proposed_dv01 = (size as f64 / 1_000_000.0) * dv01_per_million;
        if portfolio_dv01 + proposed_dv01 > self.config.dv01_cap {
            let headroom = self.config.dv01_cap - portfolio_dv01;
            let reduction_factor = if proposed_dv01 > 0.0 { headroom / proposed_dv01 } else { 0.0 };
            if reduction_factor < 0.1 {
                return TradingDecision::cancel(instrument, phases_completed, start.elapsed().as_nanos() as u64);
            }
            size = ((size as f64) * reduction_factor) as u64;
        }

        // Validity: a crossed or undersized quote is cancelled rather than posted.
        if bid_price >= ask_price || size < self.config.min_quote_size {
            return TradingDecision::cancel(instrument, phases_completed, start.elapsed().as_nanos() as u64);
        }

        // Change threshold: compare against the last quote this engine
        // posted and skip the replace if nothing moved enough to matter.
        let (last_bid, last_ask) = self.last_quote[instrument.index()].get();
        let bid_delta = (bid_price.to_decimal() - last_bid).abs();
        let ask_delta = (ask_price.to_decimal() - last_ask).abs();
        if bid_delta < self.config.price_update_threshold_32nds && ask_delta < self.config.price_update_threshold_32nds {
            return TradingDecision::no_action(instrument, phases_completed, start.elapsed().as_nanos() as u64);
        }

        self.last_quote[instrument.index()].set((bid_price.to_decimal(), ask_price.to_decimal()));

        TradingDecision {
            instrument,
            action: DecisionAction::UpdateQuotes,
            bid_price,
            ask_price,
            bid_size: size,
            ask_size: size,
            phases_completed,
            decision_latency_ns: start.elapsed().as_nanos() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_update(instrument: Instrument) -> MarketUpdate {
        MarketUpdate {
            instrument,
            best_bid: Price32nd::new(99, 16, 0),
            best_ask: Price32nd::new(99, 20, 0),
            bid_depth: 1_000_000,
            ask_depth: 1_000_000,
            last_trade_signed_quantity: 0,
            timestamp_ns: 1_000,
        }
    }

    #[test]
    fn flat_book_and_flat_position_updates_quotes() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let risk = RiskState::new();
        let curve = FairCurveSnapshot::new();
        let decision = engine.decide(&flat_update(Instrument::Note10Y), &risk, &curve);
        assert_eq!(decision.action, DecisionAction::UpdateQuotes);
        assert!(decision.bid_price < decision.ask_price);
    }

    #[test]
    fn position_at_cap_triggers_cancel_quotes() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let risk = RiskState::new();
        risk.update_position(Instrument::Note10Y, 100_000_000, 867.0);
        let curve = FairCurveSnapshot::new();
        let decision = engine.decide(&flat_update(Instrument::Note10Y), &risk, &curve);
        assert_eq!(decision.action, DecisionAction::CancelQuotes);
    }

    #[test]
    fn daily_loss_cap_breach_cancels_quotes() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let risk = RiskState::new();
        risk.update_pnl(Instrument::Note10Y, -1_000_000.0);
        let curve = FairCurveSnapshot::new();
        let decision = engine.decide(&flat_update(Instrument::Note10Y), &risk, &curve);
        assert_eq!(decision.action, DecisionAction::CancelQuotes);
    }

    #[test]
    fn same_inputs_produce_identical_decisions() {
        // Two independently built engines, each seeing the same inputs
        // exactly once: a single engine's second call would correctly be
        // suppressed to NoAction by the change-threshold check, which is not
        // what this test means to exercise.
        let build = || {
            let engine = DecisionEngine::new(EngineConfig::default());
            let risk = RiskState::new();
            risk.update_position(Instrument::Note5Y, 5_000_000, 472.0);
            let curve = FairCurveSnapshot::new();
            curve.publish(Instrument::Note5Y, 410.0, 99.0, 0.05, 1);
            (engine, risk, curve)
        };

        let update = flat_update(Instrument::Note5Y);
        let (engine_a, risk_a, curve_a) = build();
        let (engine_b, risk_b, curve_b) = build();
        let a = engine_a.decide(&update, &risk_a, &curve_a);
        let b = engine_b.decide(&update, &risk_b, &curve_b);
        assert_eq!(a.action, b.action);
        assert_eq!(a.bid_price, b.bid_price);
        assert_eq!(a.ask_price, b.ask_price);
        assert_eq!(a.bid_size, b.bid_size);
    }

    #[test]
    fn oversized_dv01_forces_cancel() {
        let mut config = EngineConfig::default();
        config.dv01_cap = 1.0;
        let engine = DecisionEngine::new(config);
        let risk = RiskState::new();
        let curve = FairCurveSnapshot::new();
        let decision = engine.decide(&flat_update(Instrument::Bond30Y), &risk, &curve);
        assert_eq!(decision.action, DecisionAction::CancelQuotes);
    }

    #[test]
    fn long_inventory_skews_center_down() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let risk = RiskState::new();
        let curve = FairCurveSnapshot::new();
        let flat = engine.decide(&flat_update(Instrument::Note10Y), &risk, &curve);

        risk.update_position(Instrument::Note10Y, 50_000_000, 867.0);
        let long = engine.decide(&flat_update(Instrument::Note10Y), &risk, &curve);
        assert!(long.bid_price <= flat.bid_price);
    }
}
