//! Kinetic Runner — run orchestration on top of `kinetic-core`.
//!
//! This crate provides:
//! - Immutable, TOML-loadable run configuration with content-hash run ids
//! - Parallel batch preparation with a skip manifest
//! - Performance metrics and benchmark comparison
//! - Bootstrap statistical validation (overall and grouped)
//! - Report artifacts (summary markdown, trades/equity CSV)

pub mod batch;
pub mod config;
pub mod metrics;
pub mod report;
pub mod run;
pub mod validator;

pub use batch::{
    load_symbol_file, load_universe_dir, prepare_universe, proxy_symbols, BatchError,
    BatchManifest, SkippedSymbol,
};
pub use config::{ConfigError, RunConfig, RunId};
pub use metrics::{BenchmarkComparison, PerformanceMetrics};
pub use report::{render_equity_csv, render_summary, render_trades_csv, write_artifacts};
pub use run::{build_context, run_portfolio, MarketInputs, PipelineResult, RunError};
pub use validator::{
    validate_grouped, validate_returns, validate_trades, BootstrapSettings, ValidationBounds,
    ValidationOutcome,
};
