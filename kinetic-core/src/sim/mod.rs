//! Portfolio simulator — a sequential reducer over the union calendar.
//!
//! Per-ticker lifecycle is FLAT → OPEN → FLAT with no partial fills or
//! pyramiding. Each calendar date runs three phases in a fixed order:
//!
//! 1. mark & exit pass — evaluate exits for open positions;
//! 2. equity snapshot — recorded after exits and before entries, so
//!    today's exits free capital for today's entries while entries never
//!    double-count in the same day's snapshot;
//! 3. entry pass — gated by the crisis halt, capacity, and cash; sized as
//!    a fraction of the snapshot equity, so the book compounds.
//!
//! Everything upstream (indicator preparation) is parallel per instrument;
//! this loop is the only stage with genuine cross-ticker shared state
//! (cash, position count) and stays single-threaded.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{EquityPoint, Portfolio, Position, Trade};
use crate::regime::{CrisisGauge, PeerSet, RegimeSeries};
use crate::strategy::{PreparedSeries, StrategyRouter};

/// Portfolio-level knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub initial_capital: f64,
    pub max_positions: usize,
    /// Per-position allocation as a fraction of current equity.
    pub position_size_pct: f64,
    /// Allocations below this are dust; the entry pass stops there.
    pub min_position_dollars: f64,
    /// The entry pass is skipped when cash is below
    /// `equity * position_size_pct * cash_reserve_ratio`.
    pub cash_reserve_ratio: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            max_positions: 10,
            position_size_pct: 0.10,
            min_position_dollars: 1_000.0,
            cash_reserve_ratio: 0.9,
        }
    }
}

/// Errors from the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParams(&'static str),
    #[error("no prepared instruments to simulate")]
    EmptyUniverse,
}

/// Market-wide context shared by every instrument.
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub regime: RegimeSeries,
    pub peers: PeerSet,
    /// Volatility panic gauge; `None` disables the crisis halt.
    pub crisis: Option<CrisisGauge>,
}

/// Output of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub final_equity: f64,
    /// Position-days marked at entry price because the symbol had no bar.
    pub stale_marks: usize,
    /// Dates on which the crisis halt suspended the entry pass.
    pub crisis_days: usize,
}

/// Run the event loop over prepared instruments.
pub fn run_simulation(
    prepared: &[PreparedSeries],
    ctx: &MarketContext,
    router: &StrategyRouter,
    params: &SimParams,
) -> Result<SimResult, SimError> {
    validate_params(params)?;
    if prepared.is_empty() {
        return Err(SimError::EmptyUniverse);
    }

    let by_symbol: HashMap<&str, &PreparedSeries> =
        prepared.iter().map(|p| (p.symbol(), p)).collect();

    let calendar: BTreeSet<NaiveDate> = prepared
        .iter()
        .flat_map(|p| p.series.bars().iter().map(|b| b.date))
        .collect();

    let mut portfolio = Portfolio::new(params.initial_capital, params.max_positions);
    let mut stale_marks = 0usize;
    let mut crisis_days = 0usize;

    for &date in &calendar {
        // ── Phase 1: mark & exit ──
        let mut open_symbols: Vec<String> = portfolio.positions.keys().cloned().collect();
        open_symbols.sort();

        let mut marks: HashMap<String, f64> = HashMap::new();
        for symbol in &open_symbols {
            let prep = by_symbol[symbol.as_str()];
            let Some(index) = prep.series.index_of(date) else {
                // No bar today: the position is marked at entry price by
                // the equity fallback, and flagged as a stale mark.
                stale_marks += 1;
                continue;
            };
            let bar = &prep.series.bars()[index];

            let exit = router
                .policy(prep.policy)
                .and_then(|policy| policy.exit(prep, index, &portfolio.positions[symbol]));

            match exit {
                Some((_, reason)) => {
                    let position = portfolio.positions.remove(symbol).expect("open position");
                    portfolio.cash += position.shares * bar.close;
                    portfolio
                        .trades
                        .push(Trade::from_exit(&position, date, bar.close, reason));
                }
                None => {
                    // Trailing high ratchets only after the exit check, so
                    // the chandelier stop never references today's high.
                    let position = portfolio
                        .positions
                        .get_mut(symbol)
                        .expect("open position");
                    position.update_high(bar.high);
                    marks.insert(symbol.clone(), bar.close);
                }
            }
        }

        // ── Phase 2: equity snapshot ──
        let equity = portfolio.equity(&marks);
        portfolio.equity_curve.push(EquityPoint { date, equity });

        // ── Phase 3: entries ──
        if let Some(gauge) = &ctx.crisis {
            if gauge.panic_on(date) {
                crisis_days += 1;
                continue;
            }
        }
        if !portfolio.has_capacity() {
            continue;
        }
        if portfolio.cash < equity * params.position_size_pct * params.cash_reserve_ratio {
            continue;
        }

        let regime = ctx.regime.at(date);

        // Candidates ranked by trend strength descending, then symbol, so
        // repeated runs fill the book identically.
        let mut candidates: Vec<(f64, &str, f64)> = Vec::new();
        for prep in prepared {
            if portfolio.has_position(prep.symbol()) {
                continue;
            }
            let Some(index) = prep.series.index_of(date) else {
                continue;
            };
            let peer = ctx.peers.trend(prep.sector, date);
            let decision = router.decide(prep, index, regime, peer);
            if decision.signal.is_buy() {
                candidates.push((prep.trend[index], prep.symbol(), prep.series.bars()[index].close));
            }
        }
        candidates.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });

        for (_, symbol, close) in candidates {
            if !portfolio.has_capacity() {
                break;
            }
            let mut target = equity * params.position_size_pct;
            if portfolio.cash < target {
                target = portfolio.cash;
            }
            if target < params.min_position_dollars {
                break;
            }
            let policy = by_symbol[symbol].policy;
            portfolio.cash -= target;
            portfolio
                .positions
                .insert(symbol.to_string(), Position::open(symbol, date, close, target, policy));
        }
    }

    let final_equity = portfolio
        .equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(params.initial_capital);

    Ok(SimResult {
        equity_curve: portfolio.equity_curve,
        trades: portfolio.trades,
        final_equity,
        stale_marks,
        crisis_days,
    })
}

fn validate_params(params: &SimParams) -> Result<(), SimError> {
    if !(params.initial_capital > 0.0) {
        return Err(SimError::InvalidParams("initial_capital must be > 0"));
    }
    if params.max_positions == 0 {
        return Err(SimError::InvalidParams("max_positions must be >= 1"));
    }
    if !(params.position_size_pct > 0.0 && params.position_size_pct <= 1.0) {
        return Err(SimError::InvalidParams(
            "position_size_pct must be in (0, 1]",
        ));
    }
    if !(params.min_position_dollars >= 0.0) {
        return Err(SimError::InvalidParams(
            "min_position_dollars must be >= 0",
        ));
    }
    Ok(())
}
