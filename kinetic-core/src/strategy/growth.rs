//! Growth policy — volatility-squeeze breakout with trailing exits.
//!
//! Entry requires, in order: the global regime not risk-off, the sector
//! proxy not in a downtrend, a band-width squeeze on the current or
//! previous bar (the breakout itself expands the bands, so the squeeze
//! condition tolerates one bar of lag), and a close above the upper band.
//!
//! Exits: chandelier stop off the trailing high, a stagnation time stop,
//! and an overheated-climax take-profit.

use serde::{Deserialize, Serialize};

use super::{Decision, PreparedSeries, StrategyPolicy, TradeSignal};
use crate::domain::{
    AlignmentError, ExitReason, InstrumentSeries, PolicyTag, Position, Sector,
};
use crate::indicators::{atr, stoch_rsi, volatility_bands};
use crate::regime::{GlobalRegime, PeerTrend};
use crate::state::trend_coordinate;

/// Tunables for the growth policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Squeeze percentile below which the bands count as compressed.
    pub squeeze_entry_pct: f64,
    /// ATR multiple for the chandelier stop.
    pub chandelier_atr_mult: f64,
    /// Days after which an unproductive position is stagnant.
    pub stagnation_days: i64,
    /// Minimum unrealized gain, as a fraction of `atr/close`, to escape the
    /// stagnation stop.
    pub stagnation_atr_frac: f64,
    /// Oscillator level ([0, 1]) marking a climax.
    pub climax_stoch: f64,
    /// Width z-score marking a climax.
    pub climax_width_z: f64,
    pub band_period: usize,
    pub band_mult: f64,
    pub rank_window: usize,
    pub stoch_period: usize,
    pub atr_period: usize,
    pub trend_k: f64,
    pub trend_window: usize,
    /// Bars required before entries are evaluated.
    pub min_history: usize,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            squeeze_entry_pct: 0.20,
            chandelier_atr_mult: 2.0,
            stagnation_days: 5,
            stagnation_atr_frac: 0.5,
            climax_stoch: 0.95,
            climax_width_z: 2.0,
            band_period: 20,
            band_mult: 2.0,
            rank_window: 120,
            stoch_period: 14,
            atr_period: 14,
            trend_k: 20.0,
            trend_window: 50,
            min_history: 200,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GrowthPolicy {
    pub params: GrowthParams,
}

impl GrowthPolicy {
    pub fn new(params: GrowthParams) -> Self {
        Self { params }
    }

    fn is_climax(&self, prep: &PreparedSeries, i: usize) -> bool {
        // NaN width_z compares false: no climax without a full window.
        prep.stoch[i] > self.params.climax_stoch && prep.width_z[i] > self.params.climax_width_z
    }
}

impl StrategyPolicy for GrowthPolicy {
    fn tag(&self) -> PolicyTag {
        PolicyTag::Growth
    }

    fn name(&self) -> &'static str {
        "growth_breakout"
    }

    fn min_history(&self) -> usize {
        self.params.min_history
    }

    fn prepare(
        &self,
        series: InstrumentSeries,
        sector: Sector,
    ) -> Result<PreparedSeries, AlignmentError> {
        let closes = series.closes();
        let p = &self.params;

        let trend = trend_coordinate(&closes, p.trend_k, p.trend_window);
        let stoch = stoch_rsi(&closes, p.stoch_period, 1);
        let atr_col = atr(series.bars(), p.atr_period);
        let bands = volatility_bands(&closes, p.band_period, p.band_mult, p.rank_window);
        let mcginley = vec![f64::NAN; closes.len()];

        PreparedSeries::new(
            series,
            sector,
            PolicyTag::Growth,
            trend,
            stoch,
            atr_col,
            mcginley,
            bands.upper,
            bands.squeeze_pct,
            bands.width_z,
        )
    }

    fn entry(
        &self,
        prep: &PreparedSeries,
        index: usize,
        regime: GlobalRegime,
        peer: PeerTrend,
    ) -> Decision {
        if index + 1 < self.params.min_history {
            return Decision::new(TradeSignal::NoTrade, "Insufficient Data");
        }
        if regime == GlobalRegime::BearRiskOff {
            return Decision::new(TradeSignal::NoTrade, "Regime Block (Bear)");
        }
        if peer == PeerTrend::Down {
            return Decision::new(TradeSignal::Wait, "Sector Weakness (Peer Down)");
        }
        if self.is_climax(prep, index) {
            return Decision::new(TradeSignal::SellClimax, "Climax: Overheated");
        }

        let close = prep.series.bars()[index].close;
        let squeeze_now = prep.squeeze_pct[index] < self.params.squeeze_entry_pct;
        let squeeze_prev =
            index >= 1 && prep.squeeze_pct[index - 1] < self.params.squeeze_entry_pct;
        let breakout = close > prep.upper_band[index];

        if (squeeze_now || squeeze_prev) && breakout {
            Decision::new(TradeSignal::BuyBreakout, "Squeeze Breakout")
        } else {
            Decision::new(TradeSignal::Hold, "Trend Continuation")
        }
    }

    fn exit(
        &self,
        prep: &PreparedSeries,
        index: usize,
        position: &Position,
    ) -> Option<(TradeSignal, ExitReason)> {
        let bar = &prep.series.bars()[index];
        let close = bar.close;
        let atr_now = prep.atr[index];

        if atr_now.is_finite() {
            let stop = position.high_since_entry - self.params.chandelier_atr_mult * atr_now;
            if close < stop {
                return Some((TradeSignal::SellStop, ExitReason::Stop));
            }
            let stagnant = position.days_held(bar.date) > self.params.stagnation_days
                && position.pnl_pct(close) < self.params.stagnation_atr_frac * atr_now / close;
            if stagnant {
                return Some((TradeSignal::SellTime, ExitReason::Time));
            }
        }
        if self.is_climax(prep, index) {
            return Some((TradeSignal::SellClimax, ExitReason::Climax));
        }
        None
    }
}
