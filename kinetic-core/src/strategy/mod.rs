//! Strategy policies and sector routing.
//!
//! Each instrument is governed by exactly one policy, selected from its
//! sector label: a breakout/momentum policy for growth-like sectors, a
//! mean-reversion policy for defensive sectors, and an avoid list. The set
//! is a closed enum so routing is exhaustively matchable — no dynamic
//! attribute lookup, no unroutable sector.

pub mod defensive;
pub mod growth;
pub mod router;

pub use defensive::{DefensiveParams, DefensivePolicy};
pub use growth::{GrowthParams, GrowthPolicy};
pub use router::{policy_for, StrategyRouter};

use crate::domain::{
    AlignmentError, ExitReason, InstrumentSeries, PolicyTag, Position, Sector,
};
use crate::regime::{GlobalRegime, PeerTrend};

/// Router/policy output for one (symbol, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub signal: TradeSignal,
    /// Names the blocking stage or the trigger; tests assert on this, since
    /// several blocking conditions can coexist.
    pub reason: &'static str,
}

impl Decision {
    pub fn new(signal: TradeSignal, reason: &'static str) -> Self {
        Self { signal, reason }
    }
}

/// Categorical trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSignal {
    NoTrade,
    Wait,
    Hold,
    BuyBreakout,
    BuyDip,
    SellStop,
    SellTarget,
    SellTime,
    SellClimax,
    /// Volatility panic override: buys suspended for the day.
    CrisisHalt,
}

impl TradeSignal {
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::BuyBreakout | Self::BuyDip)
    }

    pub fn is_sell(&self) -> bool {
        matches!(
            self,
            Self::SellStop | Self::SellTarget | Self::SellTime | Self::SellClimax
        )
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoTrade => "NO_TRADE",
            Self::Wait => "WAIT",
            Self::Hold => "HOLD",
            Self::BuyBreakout => "BUY_BREAKOUT",
            Self::BuyDip => "BUY_DIP",
            Self::SellStop => "SELL_STOP",
            Self::SellTarget => "SELL_TARGET",
            Self::SellTime => "SELL_TIME",
            Self::SellClimax => "SELL_CLIMAX",
            Self::CrisisHalt => "CRISIS_HALT",
        })
    }
}

/// An instrument with its policy's indicator columns attached.
///
/// Columns are parallel to the bar vector; `PreparedSeries::new` re-checks
/// every length so a misaligned column can never reach the simulator.
/// Columns a policy does not use are NaN-filled at the right length.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub series: InstrumentSeries,
    pub sector: Sector,
    pub policy: PolicyTag,
    /// Standardized trend strength (candidate ranking; [-3, 3]).
    pub trend: Vec<f64>,
    /// Stochastic RSI in [0, 1].
    pub stoch: Vec<f64>,
    pub atr: Vec<f64>,
    pub mcginley: Vec<f64>,
    pub upper_band: Vec<f64>,
    pub squeeze_pct: Vec<f64>,
    pub width_z: Vec<f64>,
}

impl PreparedSeries {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        series: InstrumentSeries,
        sector: Sector,
        policy: PolicyTag,
        trend: Vec<f64>,
        stoch: Vec<f64>,
        atr: Vec<f64>,
        mcginley: Vec<f64>,
        upper_band: Vec<f64>,
        squeeze_pct: Vec<f64>,
        width_z: Vec<f64>,
    ) -> Result<Self, AlignmentError> {
        series.check_aligned("trend", trend.len())?;
        series.check_aligned("stoch", stoch.len())?;
        series.check_aligned("atr", atr.len())?;
        series.check_aligned("mcginley", mcginley.len())?;
        series.check_aligned("upper_band", upper_band.len())?;
        series.check_aligned("squeeze_pct", squeeze_pct.len())?;
        series.check_aligned("width_z", width_z.len())?;
        Ok(Self {
            series,
            sector,
            policy,
            trend,
            stoch,
            atr,
            mcginley,
            upper_band,
            squeeze_pct,
            width_z,
        })
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }
}

/// One family of trading rules.
///
/// `prepare` attaches the policy's indicator columns; `entry` and `exit`
/// evaluate a single prepared row. Entry filters apply in fixed order —
/// global regime, then peer trend, then the technical trigger — and
/// short-circuit on the first block.
pub trait StrategyPolicy: Send + Sync {
    fn tag(&self) -> PolicyTag;

    fn name(&self) -> &'static str;

    /// Bars required before the policy will evaluate entries.
    fn min_history(&self) -> usize;

    fn prepare(
        &self,
        series: InstrumentSeries,
        sector: Sector,
    ) -> Result<PreparedSeries, AlignmentError>;

    fn entry(
        &self,
        prep: &PreparedSeries,
        index: usize,
        regime: GlobalRegime,
        peer: PeerTrend,
    ) -> Decision;

    fn exit(
        &self,
        prep: &PreparedSeries,
        index: usize,
        position: &Position,
    ) -> Option<(TradeSignal, ExitReason)>;
}
