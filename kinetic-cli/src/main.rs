//! Kinetic CLI — analyze, simulate, and validate commands.
//!
//! Commands:
//! - `analyze` — single-ticker kinetic dossier (coordinates, signal, commentary)
//! - `simulate` — portfolio backtest over a JSON data directory, with artifacts
//! - `validate` — bootstrap lower-bound report, optionally grouped

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};

use kinetic_core::data::parse_sector_json;
use kinetic_core::domain::{InstrumentSeries, Sector, SectorMap};
use kinetic_core::regime::{CrisisGauge, PeerSeries, RegimeSeries, PEER_MA_PERIOD, REGIME_MA_PERIOD};
use kinetic_core::state::analyze;
use kinetic_core::strategy::StrategyRouter;
use kinetic_runner::{
    load_symbol_file, load_universe_dir, run_portfolio, validate_grouped, write_artifacts,
    MarketInputs, RunConfig, ValidationOutcome,
};

const ALL_SECTORS: [Sector; 11] = [
    Sector::Technology,
    Sector::Healthcare,
    Sector::Energy,
    Sector::ConsumerCyclical,
    Sector::ConsumerDefensive,
    Sector::FinancialServices,
    Sector::Industrials,
    Sector::Utilities,
    Sector::BasicMaterials,
    Sector::CommunicationServices,
    Sector::RealEstate,
];

#[derive(Parser)]
#[command(name = "kinetic", about = "Kinetic — sector-routed signal engine and backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one ticker: kinetic coordinates, signal, and commentary.
    Analyze {
        /// Ticker symbol (expects <data_dir>/<SYMBOL>.json).
        symbol: String,

        /// Directory of OHLCV JSON files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Optional TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// How many recent rows to print.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Simulate the portfolio over every instrument in the data directory.
    Simulate {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for summary.md / trades.csv / equity.csv.
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
    },
    /// Bootstrap-validate realized trades, optionally per group.
    Validate {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Grouping key: strategy, sector, or year.
        #[arg(long, default_value = "strategy")]
        group_by: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            symbol,
            data_dir,
            config,
            rows,
        } => cmd_analyze(&symbol, &data_dir, config.as_deref(), rows),
        Commands::Simulate {
            data_dir,
            config,
            out_dir,
        } => cmd_simulate(&data_dir, config.as_deref(), &out_dir),
        Commands::Validate {
            data_dir,
            config,
            group_by,
        } => cmd_validate(&data_dir, config.as_deref(), &group_by),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            RunConfig::load(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(RunConfig::default()),
    }
}

fn load_sectors(data_dir: &Path) -> SectorMap {
    let path = data_dir.join("sector_industry.json");
    match std::fs::read_to_string(&path) {
        Ok(raw) => match parse_sector_json(&raw) {
            Ok(map) => map,
            Err(err) => {
                eprintln!("warning: sector metadata unusable ({err}); all tickers Unknown");
                SectorMap::new()
            }
        },
        Err(_) => {
            eprintln!(
                "warning: no sector metadata at {}; all tickers Unknown",
                path.display()
            );
            SectorMap::new()
        }
    }
}

fn load_optional_symbol(data_dir: &Path, symbol: &str) -> Option<InstrumentSeries> {
    let path = data_dir.join(format!("{symbol}.json"));
    if !path.exists() {
        return None;
    }
    match load_symbol_file(&path, symbol) {
        Ok(series) => Some(series),
        Err(err) => {
            eprintln!("warning: could not load {symbol}: {err}");
            None
        }
    }
}

fn load_market_inputs(data_dir: &Path, config: &RunConfig) -> MarketInputs {
    let benchmark = load_optional_symbol(data_dir, &config.benchmark);
    if benchmark.is_none() {
        eprintln!(
            "warning: benchmark {} unavailable; global regime will be UNKNOWN",
            config.benchmark
        );
    }

    let mut proxies = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for sector in ALL_SECTORS {
        let proxy = sector.proxy_symbol();
        if !seen.insert(proxy) {
            continue;
        }
        if let Some(series) = load_optional_symbol(data_dir, proxy) {
            // One proxy can serve several sectors (the SPY fallback).
            for s in ALL_SECTORS {
                if s.proxy_symbol() == proxy {
                    proxies.push((s, series.clone()));
                }
            }
        }
    }

    let volatility_proxy = load_optional_symbol(data_dir, &config.volatility_proxy);

    MarketInputs {
        benchmark,
        proxies,
        volatility_proxy,
    }
}

fn cmd_analyze(symbol: &str, data_dir: &Path, config: Option<&Path>, rows: usize) -> Result<()> {
    let config = load_config(config)?;
    let symbol = symbol.to_uppercase();

    let path = data_dir.join(format!("{symbol}.json"));
    let series =
        load_symbol_file(&path, &symbol).with_context(|| format!("loading {}", path.display()))?;

    let sectors = load_sectors(data_dir);
    let sector = sectors.sector_of(&symbol);
    let last_date = series.last_date();

    let states = analyze(&series, &config.state)?;

    println!("# {symbol} — kinetic dossier ({sector})");
    println!();
    println!("{:<12} {:>10} {:>7} {:>7} {:>7}  {}", "date", "close", "x", "y", "z", "state");
    for state in states.iter().rev().take(rows).rev() {
        println!(
            "{:<12} {:>10.2} {:>7.2} {:>7.2} {:>7.2}  {}",
            state.date.to_string(),
            state.close,
            state.x_trend,
            state.y_momentum,
            state.z_structure,
            state.tag
        );
    }
    if let Some(last) = states.last() {
        println!("\n{}", last.commentary);
    }

    // Routed signal with live filters.
    let inputs = load_market_inputs(data_dir, &config);
    let regime = inputs
        .benchmark
        .as_ref()
        .map(|b| RegimeSeries::from_benchmark(b, REGIME_MA_PERIOD).at(last_date))
        .unwrap_or(kinetic_core::regime::GlobalRegime::Unknown);
    let peer = inputs
        .proxies
        .iter()
        .find(|(s, _)| *s == sector)
        .map(|(_, proxy)| PeerSeries::from_proxy(proxy, PEER_MA_PERIOD).at(last_date))
        .unwrap_or(kinetic_core::regime::PeerTrend::Neutral);
    let crisis = inputs
        .volatility_proxy
        .as_ref()
        .map(|proxy| CrisisGauge::new(proxy, config.crisis_level).panic_on(last_date))
        .unwrap_or(false);

    let router = StrategyRouter::new(config.growth.clone(), config.defensive.clone());
    let analysis = router.analyze_ticker(series, sector, regime, peer, crisis)?;

    println!("\nregime: {}   peer: {}   strategy: {}", analysis.regime, analysis.peer, analysis.strategy);
    println!("signal: {} — {}", analysis.decision.signal, analysis.decision.reason);
    Ok(())
}

fn run_pipeline(data_dir: &Path, config: &RunConfig) -> Result<kinetic_runner::PipelineResult> {
    let sectors = load_sectors(data_dir);
    let inputs = load_market_inputs(data_dir, config);

    let mut exclude: Vec<&str> = vec![config.benchmark.as_str(), config.volatility_proxy.as_str()];
    let proxy_names = kinetic_runner::proxy_symbols();
    exclude.extend(proxy_names.iter().copied());

    let (universe, load_skips) = load_universe_dir(data_dir, &exclude)?;
    for skip in &load_skips {
        eprintln!("warning: skipped {}: {}", skip.symbol, skip.reason);
    }
    if universe.is_empty() {
        bail!("no instrument data found in {}", data_dir.display());
    }
    println!(
        "loaded {} instruments ({} unreadable)",
        universe.len(),
        load_skips.len()
    );

    let result = run_portfolio(config, universe, &inputs, &sectors)?;
    println!(
        "prepared {} instruments, skipped {}",
        result.manifest.prepared,
        result.manifest.skip_count()
    );
    Ok(result)
}

fn cmd_simulate(data_dir: &Path, config: Option<&Path>, out_dir: &Path) -> Result<()> {
    let config = load_config(config)?;
    let result = run_pipeline(data_dir, &config)?;

    println!(
        "simulated {} trades, final equity ${:.2} (run {})",
        result.sim.trades.len(),
        result.sim.final_equity,
        &result.run_id[..12]
    );
    if result.sim.crisis_days > 0 {
        println!("crisis halt suspended entries on {} days", result.sim.crisis_days);
    }

    write_artifacts(out_dir, &config, &result)?;
    println!("artifacts written to {}", out_dir.display());
    Ok(())
}

fn cmd_validate(data_dir: &Path, config: Option<&Path>, group_by: &str) -> Result<()> {
    let config = load_config(config)?;
    let sectors = load_sectors(data_dir);
    let result = run_pipeline(data_dir, &config)?;
    let trades = &result.sim.trades;

    let grouped = match group_by {
        "strategy" => validate_grouped(trades, &config.bootstrap, |t| t.policy.to_string()),
        "sector" => validate_grouped(trades, &config.bootstrap, |t| {
            sectors.sector_of(&t.symbol).to_string()
        }),
        "year" => validate_grouped(trades, &config.bootstrap, |t| t.exit_date.year().to_string()),
        other => bail!("unknown group key '{other}' (expected strategy, sector, or year)"),
    };

    println!(
        "\n{:.0}% confidence lower bounds ({} resamples)",
        config.bootstrap.confidence * 100.0,
        config.bootstrap.iterations
    );
    println!("{:<24} {:>8} {:>10} {:>10} {:>10}", "group", "trades", "PF (LB)", "Sharpe", "MaxDD");
    print_outcome_row("overall", &result.validation);
    for (group, outcome) in &grouped {
        print_outcome_row(group, outcome);
    }
    Ok(())
}

fn print_outcome_row(label: &str, outcome: &ValidationOutcome) {
    match outcome {
        ValidationOutcome::Insufficient { trade_count } => {
            println!("{label:<24} {trade_count:>8} {:>10} {:>10} {:>10}", "n/a", "n/a", "n/a");
        }
        ValidationOutcome::Bounds(b) => {
            println!(
                "{label:<24} {:>8} {:>10.2} {:>10.2} {:>9.1}%",
                b.trade_count,
                b.profit_factor_lb,
                b.sharpe_lb,
                b.max_drawdown_lb * 100.0
            );
        }
    }
}
