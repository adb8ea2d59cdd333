//! Report artifacts: summary markdown plus trades/equity CSV.
//!
//! Rendering is split from writing so the content is testable without
//! touching the filesystem.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use kinetic_core::domain::{EquityPoint, Trade};

use crate::config::RunConfig;
use crate::run::PipelineResult;
use crate::validator::ValidationOutcome;

/// Render the run summary as markdown.
pub fn render_summary(config: &RunConfig, result: &PipelineResult) -> String {
    let mut out = String::new();
    let metrics = &result.metrics;

    let _ = writeln!(out, "# Portfolio Simulation Report\n");
    let _ = writeln!(out, "- **Run ID**: `{}`", result.run_id);
    let _ = writeln!(
        out,
        "- **Initial Capital**: ${:.0}",
        config.sim.initial_capital
    );
    let _ = writeln!(out, "- **Max Positions**: {}", config.sim.max_positions);
    let _ = writeln!(
        out,
        "- **Position Size**: {:.0}% of equity",
        config.sim.position_size_pct * 100.0
    );
    let _ = writeln!(out, "- **Final Equity**: ${:.2}\n", result.sim.final_equity);

    let _ = writeln!(out, "## Performance vs Benchmark\n");
    match &result.comparison {
        Some(cmp) => {
            let _ = writeln!(out, "| Metric | Portfolio | {} | Diff |", config.benchmark);
            let _ = writeln!(out, "| --- | --- | --- | --- |");
            let _ = writeln!(
                out,
                "| CAGR | {:.2}% | {:.2}% | {:+.2}% |",
                cmp.portfolio_cagr * 100.0,
                cmp.benchmark_cagr * 100.0,
                (cmp.portfolio_cagr - cmp.benchmark_cagr) * 100.0
            );
            let _ = writeln!(
                out,
                "| Sharpe | {:.2} | {:.2} | {:+.2} |",
                cmp.portfolio_sharpe,
                cmp.benchmark_sharpe,
                cmp.portfolio_sharpe - cmp.benchmark_sharpe
            );
            let _ = writeln!(
                out,
                "| Max Drawdown | {:.2}% | {:.2}% | {:+.2}% |",
                cmp.portfolio_max_drawdown * 100.0,
                cmp.benchmark_max_drawdown * 100.0,
                (cmp.portfolio_max_drawdown - cmp.benchmark_max_drawdown) * 100.0
            );
            let _ = writeln!(out);
            if cmp.beats_benchmark() {
                let _ = writeln!(
                    out,
                    "**System beats the market**: higher return with no deeper drawdown.\n"
                );
            } else if cmp.portfolio_cagr > cmp.benchmark_cagr {
                let _ = writeln!(
                    out,
                    "**High return / high risk**: outperformed with deeper drawdowns.\n"
                );
            } else {
                let _ = writeln!(out, "**Underperformed buy-and-hold** over this window.\n");
            }
        }
        None => {
            let _ = writeln!(out, "_No benchmark series supplied._\n");
        }
    }

    let _ = writeln!(out, "## Trade Statistics\n");
    let _ = writeln!(out, "- **Total Trades**: {}", metrics.trade_count);
    let _ = writeln!(out, "- **Win Rate**: {:.1}%", metrics.win_rate * 100.0);
    let _ = writeln!(out, "- **Profit Factor**: {:.2}", metrics.profit_factor);
    let _ = writeln!(out, "- **Avg Holding Period**: {:.1} days", metrics.avg_days_held);
    let _ = writeln!(out, "- **Stale Marks**: {}", result.sim.stale_marks);
    let _ = writeln!(out, "- **Crisis-Halt Days**: {}\n", result.sim.crisis_days);

    let _ = writeln!(out, "## Statistical Validation\n");
    render_validation(&mut out, "Overall", &result.validation);
    for (group, outcome) in &result.validation_by_strategy {
        render_validation(&mut out, group, outcome);
    }

    if !result.manifest.skipped.is_empty() {
        let _ = writeln!(out, "\n## Skipped Instruments\n");
        let _ = writeln!(
            out,
            "{} prepared, {} skipped:\n",
            result.manifest.prepared,
            result.manifest.skip_count()
        );
        for skip in &result.manifest.skipped {
            let _ = writeln!(out, "- **{}**: {}", skip.symbol, skip.reason);
        }
    }

    out
}

fn render_validation(out: &mut String, label: &str, outcome: &ValidationOutcome) {
    match outcome {
        ValidationOutcome::Insufficient { trade_count } => {
            let _ = writeln!(
                out,
                "- **{label}**: insufficient sample ({trade_count} trades)"
            );
        }
        ValidationOutcome::Bounds(b) => {
            let _ = writeln!(
                out,
                "- **{label}** ({:.0}% confidence, {} trades): PF LB {:.2}, \
                 Sharpe LB {:.2}, MaxDD LB {:.1}%",
                b.confidence * 100.0,
                b.trade_count,
                b.profit_factor_lb,
                b.sharpe_lb,
                b.max_drawdown_lb * 100.0
            );
        }
    }
}

/// Render the trade log as CSV.
pub fn render_trades_csv(trades: &[Trade]) -> String {
    let mut out = String::from(
        "symbol,strategy,entry_date,exit_date,entry_price,exit_price,shares,pnl_pct,days_held,exit_reason\n",
    );
    for trade in trades {
        let _ = writeln!(
            out,
            "{},{},{},{},{:.4},{:.4},{:.4},{:.6},{},{}",
            trade.symbol,
            trade.policy,
            trade.entry_date,
            trade.exit_date,
            trade.entry_price,
            trade.exit_price,
            trade.shares,
            trade.pnl_pct,
            trade.days_held,
            trade.exit_reason
        );
    }
    out
}

/// Render the equity curve as CSV.
pub fn render_equity_csv(curve: &[EquityPoint]) -> String {
    let mut out = String::from("date,equity\n");
    for point in curve {
        let _ = writeln!(out, "{},{:.2}", point.date, point.equity);
    }
    out
}

/// Write summary.md, trades.csv, and equity.csv into `dir`.
pub fn write_artifacts(dir: &Path, config: &RunConfig, result: &PipelineResult) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let summary_path = dir.join("summary.md");
    fs::write(&summary_path, render_summary(config, result))
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    let trades_path = dir.join("trades.csv");
    fs::write(&trades_path, render_trades_csv(&result.sim.trades))
        .with_context(|| format!("failed to write {}", trades_path.display()))?;

    let equity_path = dir.join("equity.csv");
    fs::write(&equity_path, render_equity_csv(&result.sim.equity_curve))
        .with_context(|| format!("failed to write {}", equity_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kinetic_core::domain::{ExitReason, PolicyTag};

    fn sample_trade() -> Trade {
        let entry_date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        Trade {
            symbol: "JNJ".into(),
            policy: PolicyTag::Defensive,
            entry_date,
            exit_date: entry_date + chrono::Duration::days(7),
            entry_price: 150.0,
            exit_price: 166.5,
            shares: 66.6667,
            pnl_pct: 0.11,
            days_held: 7,
            exit_reason: ExitReason::Target,
        }
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = render_trades_csv(&[sample_trade()]);
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("symbol,strategy,"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("JNJ,Defensive,2023-05-01,2023-05-08,"));
        assert!(row.ends_with("Profit (Target)"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn equity_csv_format() {
        let curve = vec![
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                equity: 100_000.0,
            },
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2023, 5, 2).unwrap(),
                equity: 100_250.5,
            },
        ];
        let csv = render_equity_csv(&curve);
        assert_eq!(
            csv,
            "date,equity\n2023-05-01,100000.00\n2023-05-02,100250.50\n"
        );
    }
}
