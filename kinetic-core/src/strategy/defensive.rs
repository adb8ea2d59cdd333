//! Defensive policy — mean-reversion dip buying in uptrending names.
//!
//! Entry: sector proxy not in a downtrend (no falling knives), close above
//! the McGinley dynamic, oscillator oversold. The global regime is
//! deliberately ignored — defensive names are traded through bear markets.
//!
//! Exits are fixed-fraction: -5% stop, +10% target, 10-day time stop.

use serde::{Deserialize, Serialize};

use super::{Decision, PreparedSeries, StrategyPolicy, TradeSignal};
use crate::domain::{
    AlignmentError, ExitReason, InstrumentSeries, PolicyTag, Position, Sector,
};
use crate::indicators::{atr, mcginley_dynamic, stoch_rsi};
use crate::regime::{GlobalRegime, PeerTrend};
use crate::state::trend_coordinate;

/// Tunables for the defensive policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefensiveParams {
    pub mcginley_period: usize,
    /// The McGinley responsiveness constant is `period * k_scale`.
    pub mcginley_k_scale: f64,
    pub stoch_period: usize,
    /// Oscillator level ([0, 1]) below which a dip is oversold.
    pub oversold: f64,
    /// Unrealized loss fraction triggering the stop (negative).
    pub stop_loss: f64,
    /// Unrealized gain fraction triggering the target.
    pub profit_target: f64,
    /// Calendar days after which the time stop fires.
    pub max_hold_days: i64,
    pub trend_k: f64,
    pub trend_window: usize,
    pub min_history: usize,
}

impl Default for DefensiveParams {
    fn default() -> Self {
        Self {
            mcginley_period: 14,
            mcginley_k_scale: 0.6,
            stoch_period: 14,
            oversold: 0.20,
            stop_loss: -0.05,
            profit_target: 0.10,
            max_hold_days: 10,
            trend_k: 20.0,
            trend_window: 50,
            min_history: 20,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DefensivePolicy {
    pub params: DefensiveParams,
}

impl DefensivePolicy {
    pub fn new(params: DefensiveParams) -> Self {
        Self { params }
    }
}

impl StrategyPolicy for DefensivePolicy {
    fn tag(&self) -> PolicyTag {
        PolicyTag::Defensive
    }

    fn name(&self) -> &'static str {
        "defensive_meanrev"
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
        let n = closes.len();

        let trend = trend_coordinate(&closes, p.trend_k, p.trend_window);
        let stoch = stoch_rsi(&closes, p.stoch_period, 1);
        let mcginley = mcginley_dynamic(&closes, p.mcginley_period as f64 * p.mcginley_k_scale);
        let atr_col = atr(series.bars(), 14);

        PreparedSeries::new(
            series,
            sector,
            PolicyTag::Defensive,
            trend,
            stoch,
            atr_col,
            mcginley,
            vec![f64::NAN; n],
            vec![f64::NAN; n],
            vec![f64::NAN; n],
        )
    }

    fn entry(
        &self,
        prep: &PreparedSeries,
        index: usize,
        _regime: GlobalRegime,
        peer: PeerTrend,
    ) -> Decision {
        if index + 1 < self.params.min_history {
            return Decision::new(TradeSignal::NoTrade, "Insufficient Data");
        }
        if peer == PeerTrend::Down {
            return Decision::new(TradeSignal::Wait, "Sector Weakness (Peer Down)");
        }

        let close = prep.series.bars()[index].close;
        let uptrend = prep.mcginley[index].is_finite() && close > prep.mcginley[index];
        let oversold = prep.stoch[index] < self.params.oversold;

        if uptrend && oversold {
            Decision::new(TradeSignal::BuyDip, "Mean Reversion Dip")
        } else {
            Decision::new(TradeSignal::Hold, "Wait")
        }
    }

    fn exit(
        &self,
        prep: &PreparedSeries,
        index: usize,
        position: &Position,
    ) -> Option<(TradeSignal, ExitReason)> {
        let bar = &prep.series.bars()[index];
        let pnl = position.pnl_pct(bar.close);

        if pnl < self.params.stop_loss {
            Some((TradeSignal::SellStop, ExitReason::Stop))
        } else if pnl > self.params.profit_target {
            Some((TradeSignal::SellTarget, ExitReason::Target))
        } else if position.days_held(bar.date) > self.params.max_hold_days {
            Some((TradeSignal::SellTime, ExitReason::Time))
        } else {
            None
        }
    }
}
