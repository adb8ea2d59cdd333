//! Sector → policy routing and single-ticker analysis.

use super::{
    Decision, DefensiveParams, DefensivePolicy, GrowthParams, GrowthPolicy, PreparedSeries,
    StrategyPolicy, TradeSignal,
};
use crate::domain::{AlignmentError, InstrumentSeries, PolicyTag, Sector};
use crate::regime::{GlobalRegime, PeerTrend};

/// Pure sector → policy routing.
///
/// Growth: momentum-heavy sectors plus Unknown (unclassified names tend to
/// be recent listings). Avoid: Energy. Everything else is defensive.
pub fn policy_for(sector: Sector) -> PolicyTag {
    match sector {
        Sector::Technology | Sector::ConsumerCyclical | Sector::Unknown => PolicyTag::Growth,
        Sector::Energy => PolicyTag::Avoid,
        _ => PolicyTag::Defensive,
    }
}

/// Holds the configured policy instances and routes instruments to them.
#[derive(Debug, Clone, Default)]
pub struct StrategyRouter {
    pub growth: GrowthPolicy,
    pub defensive: DefensivePolicy,
}

/// Single-shot analysis of one ticker at its latest bar.
#[derive(Debug, Clone)]
pub struct TickerAnalysis {
    pub symbol: String,
    pub sector: Sector,
    pub policy: PolicyTag,
    pub strategy: &'static str,
    pub regime: GlobalRegime,
    pub peer: PeerTrend,
    pub decision: Decision,
}

impl StrategyRouter {
    pub fn new(growth: GrowthParams, defensive: DefensiveParams) -> Self {
        Self {
            growth: GrowthPolicy::new(growth),
            defensive: DefensivePolicy::new(defensive),
        }
    }

    /// The policy for a tag; `Avoid` has none.
    pub fn policy(&self, tag: PolicyTag) -> Option<&dyn StrategyPolicy> {
        match tag {
            PolicyTag::Growth => Some(&self.growth),
            PolicyTag::Defensive => Some(&self.defensive),
            PolicyTag::Avoid => None,
        }
    }

    /// Route and prepare one instrument. `Ok(None)` means the sector is on
    /// the avoid list (reported, never traded).
    pub fn prepare(
        &self,
        series: InstrumentSeries,
        sector: Sector,
    ) -> Result<Option<PreparedSeries>, AlignmentError> {
        match self.policy(policy_for(sector)) {
            Some(policy) => policy.prepare(series, sector).map(Some),
            None => Ok(None),
        }
    }

    /// Entry decision for a prepared instrument at `index`.
    pub fn decide(
        &self,
        prep: &PreparedSeries,
        index: usize,
        regime: GlobalRegime,
        peer: PeerTrend,
    ) -> Decision {
        match self.policy(prep.policy) {
            Some(policy) => policy.entry(prep, index, regime, peer),
            None => Decision::new(TradeSignal::NoTrade, "Sector Avoidance"),
        }
    }

    /// Analyze one ticker at its most recent bar, applying the volatility
    /// panic override to buy-class decisions.
    pub fn analyze_ticker(
        &self,
        series: InstrumentSeries,
        sector: Sector,
        regime: GlobalRegime,
        peer: PeerTrend,
        crisis: bool,
    ) -> Result<TickerAnalysis, AlignmentError> {
        let symbol = series.symbol().to_string();
        let tag = policy_for(sector);

        let (strategy, decision) = match self.policy(tag) {
            None => ("avoid", Decision::new(TradeSignal::NoTrade, "Sector Avoidance")),
            Some(policy) => {
                let prep = policy.prepare(series, sector)?;
                let mut decision = policy.entry(&prep, prep.series.len() - 1, regime, peer);
                if crisis && decision.signal.is_buy() {
                    decision =
                        Decision::new(TradeSignal::CrisisHalt, "Crisis Halt (Volatility Panic)");
                }
                (policy.name(), decision)
            }
        };

        Ok(TickerAnalysis {
            symbol,
            sector,
            policy: tag,
            strategy,
            regime,
            peer,
            decision,
        })
    }
}
