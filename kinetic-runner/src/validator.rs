//! Bootstrap statistical validation of trade-return samples.
//!
//! Resamples the realized returns with replacement and reports one-sided
//! lower confidence bounds for profit factor, annualized Sharpe, and max
//! drawdown — the conservative numbers behind a go/no-go statement such as
//! "at 98% confidence the Sharpe exceeds X".
//!
//! Each resample derives its own RNG from the base seed, so the resampled
//! distribution is identical whether iterations run sequentially or on the
//! rayon pool.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use kinetic_core::domain::Trade;

use crate::metrics::{annualized_sharpe, profit_factor_of_returns};

/// Fewer realized trades than this and the sample is too thin to resample.
pub const MIN_TRADES: usize = 5;

/// Resample-count clamp.
const MIN_RESAMPLES: usize = 500;
const MAX_RESAMPLES: usize = 5000;

/// Bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Number of resamples; clamped to [500, 5000] at run time.
    pub iterations: usize,
    /// One-sided confidence level for the lower bounds.
    pub confidence: f64,
    /// Base RNG seed.
    pub seed: u64,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            iterations: 2000,
            confidence: 0.98,
            seed: 42,
        }
    }
}

/// Lower-bound estimates at a stated confidence level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationBounds {
    pub profit_factor_lb: f64,
    pub sharpe_lb: f64,
    /// Negative fraction (e.g. -0.18 = 18% drawdown).
    pub max_drawdown_lb: f64,
    /// Mean of the bootstrapped Sharpe distribution, for reference.
    pub sharpe_mean: f64,
    pub trade_count: usize,
    pub confidence: f64,
    pub resamples: usize,
}

/// Validation outcome: bounds, or an explicit insufficient-sample marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// Too few trades to resample; no metrics are fabricated.
    Insufficient { trade_count: usize },
    Bounds(ValidationBounds),
}

impl ValidationOutcome {
    pub fn bounds(&self) -> Option<&ValidationBounds> {
        match self {
            Self::Bounds(b) => Some(b),
            Self::Insufficient { .. } => None,
        }
    }
}

/// Validate a sample of realized trade returns (fractions).
pub fn validate_returns(returns: &[f64], settings: &BootstrapSettings) -> ValidationOutcome {
    let n = returns.len();
    if n < MIN_TRADES {
        return ValidationOutcome::Insufficient { trade_count: n };
    }

    let resamples = settings.iterations.clamp(MIN_RESAMPLES, MAX_RESAMPLES);

    let stats: Vec<(f64, f64, f64)> = (0..resamples)
        .into_par_iter()
        .map(|iteration| {
            // Independent stream per iteration: deterministic under any
            // execution order.
            let mut rng = StdRng::seed_from_u64(
                settings
                    .seed
                    .wrapping_add((iteration as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            );
            let sample: Vec<f64> = (0..n).map(|_| returns[rng.gen_range(0..n)]).collect();
            (
                annualized_sharpe(&sample),
                profit_factor_of_returns(&sample),
                compound_max_drawdown(&sample),
            )
        })
        .collect();

    let mut sharpes: Vec<f64> = stats.iter().map(|s| s.0).collect();
    let mut pfs: Vec<f64> = stats.iter().map(|s| s.1).collect();
    let mut mdds: Vec<f64> = stats.iter().map(|s| s.2).collect();
    sort_ascending(&mut sharpes);
    sort_ascending(&mut pfs);
    sort_ascending(&mut mdds);

    let rank = lower_bound_rank(resamples, settings.confidence);
    let sharpe_mean = sharpes.iter().sum::<f64>() / sharpes.len() as f64;

    ValidationOutcome::Bounds(ValidationBounds {
        profit_factor_lb: pfs[rank],
        sharpe_lb: sharpes[rank],
        max_drawdown_lb: mdds[rank],
        sharpe_mean,
        trade_count: n,
        confidence: settings.confidence,
        resamples,
    })
}

/// Validate a trade log.
pub fn validate_trades(trades: &[Trade], settings: &BootstrapSettings) -> ValidationOutcome {
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    validate_returns(&returns, settings)
}

/// Validate per group (sector, strategy, exit year, ...), keyed by the
/// supplied function. Groups come back in key order.
pub fn validate_grouped<F>(
    trades: &[Trade],
    settings: &BootstrapSettings,
    key_fn: F,
) -> BTreeMap<String, ValidationOutcome>
where
    F: Fn(&Trade) -> String,
{
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for trade in trades {
        grouped.entry(key_fn(trade)).or_default().push(trade.pnl_pct);
    }
    grouped
        .into_iter()
        .map(|(key, returns)| (key, validate_returns(&returns, settings)))
        .collect()
}

/// Max drawdown of the synthetic equity curve built by compounding the
/// sample in order.
fn compound_max_drawdown(returns: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for &r in returns {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        }
        let dd = (equity - peak) / peak;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Index of the one-sided lower bound: `floor(B × (1 − confidence))`.
fn lower_bound_rank(resamples: usize, confidence: f64) -> usize {
    let rank = (resamples as f64 * (1.0 - confidence)).floor() as usize;
    rank.min(resamples - 1)
}

fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
}
