//! Pipeline orchestration: universe in, simulated/validated results out.
//!
//! Filter context (benchmark regime, sector proxies, volatility gauge) is
//! always built from full history — a simulation window only clips the
//! tradeable universe, never the moving averages feeding the filters.

use std::collections::BTreeMap;

use thiserror::Error;

use kinetic_core::domain::{InstrumentSeries, Sector, SectorMap};
use kinetic_core::regime::{
    CrisisGauge, PeerSeries, PeerSet, RegimeSeries, PEER_MA_PERIOD, REGIME_MA_PERIOD,
};
use kinetic_core::sim::{run_simulation, MarketContext, SimError, SimResult};
use kinetic_core::strategy::StrategyRouter;

use crate::batch::{prepare_universe, BatchError, BatchManifest};
use crate::config::{RunConfig, RunId};
use crate::metrics::{BenchmarkComparison, PerformanceMetrics};
use crate::validator::{validate_grouped, validate_trades, ValidationOutcome};

/// Errors from the assembled pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Everything one run produces.
#[derive(Debug)]
pub struct PipelineResult {
    pub run_id: RunId,
    pub sim: SimResult,
    pub metrics: PerformanceMetrics,
    /// Absent when no benchmark series was supplied.
    pub comparison: Option<BenchmarkComparison>,
    pub validation: ValidationOutcome,
    pub validation_by_strategy: BTreeMap<String, ValidationOutcome>,
    pub manifest: BatchManifest,
}

/// External inputs to one run, already ingested.
#[derive(Debug, Default)]
pub struct MarketInputs {
    pub benchmark: Option<InstrumentSeries>,
    pub proxies: Vec<(Sector, InstrumentSeries)>,
    pub volatility_proxy: Option<InstrumentSeries>,
}

/// Run the full pipeline: prepare, simulate, measure, validate.
pub fn run_portfolio(
    config: &RunConfig,
    universe: Vec<InstrumentSeries>,
    inputs: &MarketInputs,
    sectors: &SectorMap,
) -> Result<PipelineResult, RunError> {
    let router = StrategyRouter::new(config.growth.clone(), config.defensive.clone());

    let universe: Vec<InstrumentSeries> = universe
        .into_iter()
        .filter_map(|s| clip_series(s, config))
        .collect();

    let (prepared, manifest) = prepare_universe(universe, sectors, &router)?;

    let ctx = build_context(config, inputs);
    let sim = run_simulation(&prepared, &ctx, &router, &config.sim)?;

    let equity: Vec<f64> = sim.equity_curve.iter().map(|p| p.equity).collect();
    let metrics = PerformanceMetrics::compute(&equity, &sim.trades);

    let comparison = inputs.benchmark.as_ref().map(|bench| {
        let bench_closes = benchmark_closes_on(&sim, bench);
        BenchmarkComparison::compute(&equity, &bench_closes)
    });

    let validation = validate_trades(&sim.trades, &config.bootstrap);
    let validation_by_strategy =
        validate_grouped(&sim.trades, &config.bootstrap, |t| t.policy.to_string());

    Ok(PipelineResult {
        run_id: config.run_id(),
        sim,
        metrics,
        comparison,
        validation,
        validation_by_strategy,
        manifest,
    })
}

/// Build the shared filter context from full-history inputs.
pub fn build_context(config: &RunConfig, inputs: &MarketInputs) -> MarketContext {
    let regime = match &inputs.benchmark {
        Some(bench) => RegimeSeries::from_benchmark(bench, REGIME_MA_PERIOD),
        None => RegimeSeries::unknown(),
    };

    let mut peers = PeerSet::new();
    for (sector, proxy) in &inputs.proxies {
        peers.insert(*sector, PeerSeries::from_proxy(proxy, PEER_MA_PERIOD));
    }

    let crisis = inputs
        .volatility_proxy
        .as_ref()
        .map(|proxy| CrisisGauge::new(proxy, config.crisis_level));

    MarketContext {
        regime,
        peers,
        crisis,
    }
}

/// Clip a series to the configured window; `None` when nothing remains.
fn clip_series(series: InstrumentSeries, config: &RunConfig) -> Option<InstrumentSeries> {
    if config.start_date.is_none() && config.end_date.is_none() {
        return Some(series);
    }
    let symbol = series.symbol().to_string();
    let bars: Vec<_> = series
        .bars()
        .iter()
        .filter(|b| {
            config.start_date.map_or(true, |start| b.date >= start)
                && config.end_date.map_or(true, |end| b.date <= end)
        })
        .cloned()
        .collect();
    InstrumentSeries::new(symbol, bars).ok()
}

/// Benchmark closes aligned to the simulated equity dates (most recent
/// benchmark bar at or before each date; leading dates before the
/// benchmark's history fall back to its first close).
fn benchmark_closes_on(sim: &SimResult, benchmark: &InstrumentSeries) -> Vec<f64> {
    let first_close = benchmark.bars()[0].close;
    sim.equity_curve
        .iter()
        .map(|p| {
            benchmark
                .index_at_or_before(p.date)
                .map(|i| benchmark.bars()[i].close)
                .unwrap_or(first_close)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kinetic_core::domain::PriceBar;

    fn series_from_closes(symbol: &str, closes: &[f64]) -> InstrumentSeries {
        let base_date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                PriceBar {
                    date: base_date + chrono::Duration::days(i as i64),
                    open,
                    high: open.max(close) + 0.5,
                    low: (open.min(close) - 0.5).max(0.01),
                    close,
                    volume: 1000,
                }
            })
            .collect();
        InstrumentSeries::new(symbol, bars).unwrap()
    }

    #[test]
    fn clip_window_drops_outside_bars() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes("AAPL", &closes);
        let mut config = RunConfig::default();
        config.start_date = NaiveDate::from_ymd_opt(2022, 1, 10);
        config.end_date = NaiveDate::from_ymd_opt(2022, 1, 20);
        let clipped = clip_series(series, &config).unwrap();
        assert!(clipped.first_date() >= config.start_date.unwrap());
        assert!(clipped.last_date() <= config.end_date.unwrap());
    }

    #[test]
    fn clip_window_outside_range_removes_series() {
        let series = series_from_closes("AAPL", &[100.0, 101.0]);
        let mut config = RunConfig::default();
        config.start_date = NaiveDate::from_ymd_opt(2030, 1, 1);
        assert!(clip_series(series, &config).is_none());
    }

    #[test]
    fn context_without_benchmark_is_unknown_regime() {
        let config = RunConfig::default();
        let ctx = build_context(&config, &MarketInputs::default());
        let regime = ctx
            .regime
            .at(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(regime, kinetic_core::regime::GlobalRegime::Unknown);
    }
}
