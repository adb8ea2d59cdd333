//! Performance metrics — pure functions over equity curves and trade logs.
//!
//! No dependency on the simulator or data layer: curves in, scalars out.
//! Degenerate inputs (short curves, zero variance, no losses) yield defined
//! sentinels, never NaN or Inf.

use serde::{Deserialize, Serialize};

use kinetic_core::domain::Trade;

/// Trading days per year, for annualization.
const TRADING_DAYS: f64 = 252.0;

/// Aggregate performance metrics for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub avg_days_held: f64,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[f64], trades: &[Trade]) -> Self {
        Self {
            total_return: total_return(equity_curve),
            cagr: cagr(equity_curve, equity_curve.len()),
            sharpe: sharpe_ratio(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            avg_days_held: avg_days_held(trades),
        }
    }
}

/// Side-by-side comparison against a buy-and-hold benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub portfolio_cagr: f64,
    pub benchmark_cagr: f64,
    pub portfolio_sharpe: f64,
    pub benchmark_sharpe: f64,
    pub portfolio_max_drawdown: f64,
    pub benchmark_max_drawdown: f64,
}

impl BenchmarkComparison {
    /// Compare a portfolio curve with benchmark closes over the same span.
    pub fn compute(portfolio: &[f64], benchmark_closes: &[f64]) -> Self {
        Self {
            portfolio_cagr: cagr(portfolio, portfolio.len()),
            benchmark_cagr: cagr(benchmark_closes, benchmark_closes.len()),
            portfolio_sharpe: sharpe_ratio(portfolio),
            benchmark_sharpe: sharpe_ratio(benchmark_closes),
            portfolio_max_drawdown: max_drawdown(portfolio),
            benchmark_max_drawdown: max_drawdown(benchmark_closes),
        }
    }

    pub fn beats_benchmark(&self) -> bool {
        self.portfolio_cagr > self.benchmark_cagr
            && self.portfolio_max_drawdown >= self.benchmark_max_drawdown
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = *equity_curve.last().unwrap();
    if initial <= 0.0 {
        return 0.0;
    }
    (final_eq - initial) / initial
}

/// Compound annual growth rate, assuming 252 trading days per year.
pub fn cagr(equity_curve: &[f64], trading_days: usize) -> f64 {
    if equity_curve.len() < 2 || trading_days < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = *equity_curve.last().unwrap();
    if initial <= 0.0 || final_eq <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS;
    (final_eq / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio of daily returns. 0.0 when variance vanishes.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = daily_returns(equity_curve);
    annualized_sharpe(&returns)
}

/// Annualized Sharpe from a return series: `mean/σ × √252`, 0.0 if σ = 0.
pub fn annualized_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * TRADING_DAYS.sqrt()
}

/// Maximum drawdown as a negative fraction (-0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of trades with positive realized return.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross positive return over gross non-positive return, on realized
/// fractions. 0.0 when there are no losses (explicit sentinel).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    profit_factor_of_returns(&returns)
}

/// Profit factor over raw return fractions.
pub fn profit_factor_of_returns(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|&&r| r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|&&r| r <= 0.0).sum::<f64>().abs();
    if losses > 1e-12 {
        gains / losses
    } else {
        0.0
    }
}

/// Mean holding period in calendar days.
pub fn avg_days_held(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.days_held as f64).sum::<f64>() / trades.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Daily fractional returns of an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
