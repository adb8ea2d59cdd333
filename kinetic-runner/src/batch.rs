//! Batch preparation: route and precompute every instrument in parallel.
//!
//! Per-instrument preparation is independent across tickers, so it fans
//! out on the rayon pool. A failing instrument never aborts the batch: it
//! is recorded in the manifest with its reason and excluded from the run.
//! The batch fails only when zero instruments survive.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use kinetic_core::data::{parse_ohlcv_json, IngestError};
use kinetic_core::domain::{AlignmentError, InstrumentSeries, PolicyTag, Sector, SectorMap};
use kinetic_core::strategy::{policy_for, PreparedSeries, StrategyRouter};

/// Errors that fail the whole batch.
///
/// Expected data problems (short history, avoid sectors, malformed files)
/// become manifest entries instead; an alignment violation is a
/// programming error and aborts the run rather than being skipped.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no instruments were prepared successfully ({skipped} skipped)")]
    NothingPrepared { skipped: usize },
    #[error("failed to read data directory '{path}': {source}")]
    DataDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
}

/// One excluded instrument and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Per-run preparation report: what ran, what was skipped and why.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchManifest {
    pub prepared: usize,
    pub skipped: Vec<SkippedSymbol>,
}

impl BatchManifest {
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Route and prepare a universe of series.
///
/// Returns the prepared instruments (input order preserved) plus the
/// manifest. Avoid-sector and short-history instruments are skipped with
/// reasons, as are alignment failures.
pub fn prepare_universe(
    universe: Vec<InstrumentSeries>,
    sectors: &SectorMap,
    router: &StrategyRouter,
) -> Result<(Vec<PreparedSeries>, BatchManifest), BatchError> {
    let results: Vec<Result<Result<PreparedSeries, SkippedSymbol>, AlignmentError>> = universe
        .into_par_iter()
        .map(|series| prepare_one(series, sectors, router))
        .collect();

    let mut prepared = Vec::new();
    let mut manifest = BatchManifest::default();
    for result in results {
        match result? {
            Ok(prep) => prepared.push(prep),
            Err(skip) => manifest.skipped.push(skip),
        }
    }
    manifest.prepared = prepared.len();

    if prepared.is_empty() {
        return Err(BatchError::NothingPrepared {
            skipped: manifest.skipped.len(),
        });
    }
    Ok((prepared, manifest))
}

/// Inner `Err` is an expected skip; outer `Err` is an alignment violation,
/// which is a programming error and must fail the batch.
fn prepare_one(
    series: InstrumentSeries,
    sectors: &SectorMap,
    router: &StrategyRouter,
) -> Result<Result<PreparedSeries, SkippedSymbol>, AlignmentError> {
    let symbol = series.symbol().to_string();
    let sector = sectors.sector_of(&symbol);
    let tag = policy_for(sector);

    if tag == PolicyTag::Avoid {
        return Ok(Err(SkippedSymbol {
            symbol,
            reason: format!("sector avoidance ({sector})"),
        }));
    }

    let min_history = router
        .policy(tag)
        .map(|p| p.min_history())
        .unwrap_or_default();
    if series.len() < min_history {
        return Ok(Err(SkippedSymbol {
            symbol,
            reason: format!(
                "insufficient history ({} bars, {min_history} required)",
                series.len()
            ),
        }));
    }

    match router.prepare(series, sector)? {
        Some(prep) => Ok(Ok(prep)),
        None => Ok(Err(SkippedSymbol {
            symbol,
            reason: format!("sector avoidance ({sector})"),
        })),
    }
}

/// Load every instrument JSON in a directory, excluding the benchmark,
/// the volatility proxy, sector-proxy ETFs, and metadata files.
///
/// Unreadable or malformed files are skipped with reasons; they surface in
/// the returned manifest-style list rather than failing the load.
pub fn load_universe_dir(
    dir: &Path,
    exclude: &[&str],
) -> Result<(Vec<InstrumentSeries>, Vec<SkippedSymbol>), BatchError> {
    let entries = std::fs::read_dir(dir).map_err(|source| BatchError::DataDir {
        path: dir.display().to_string(),
        source,
    })?;

    // Deterministic order regardless of directory iteration order.
    let mut files: BTreeMap<String, std::path::PathBuf> = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let symbol = stem.to_uppercase();
        if symbol.starts_with("INDEX") || symbol == "SECTOR_INDUSTRY" {
            continue;
        }
        if exclude.iter().any(|e| e.eq_ignore_ascii_case(&symbol)) {
            continue;
        }
        files.insert(symbol, path);
    }

    let mut loaded = Vec::new();
    let mut skipped = Vec::new();
    for (symbol, path) in files {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: format!("unreadable file: {err}"),
                });
                continue;
            }
        };
        match parse_ohlcv_json(&symbol, &raw) {
            Ok(ingested) => loaded.push(ingested.series),
            Err(err) => skipped.push(SkippedSymbol {
                symbol,
                reason: err.to_string(),
            }),
        }
    }
    Ok((loaded, skipped))
}

/// Load one instrument's JSON file (benchmark, proxy, ...).
pub fn load_symbol_file(path: &Path, symbol: &str) -> Result<InstrumentSeries, IngestError> {
    let raw = std::fs::read_to_string(path).map_err(|err| IngestError::Json {
        symbol: symbol.to_string(),
        source: serde_json::Error::io(err),
    })?;
    Ok(parse_ohlcv_json(symbol, &raw)?.series)
}

/// Sector proxy symbols for every routable sector.
pub fn proxy_symbols() -> Vec<&'static str> {
    let mut symbols: Vec<&'static str> = [
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
    ]
    .iter()
    .map(|s| s.proxy_symbol())
    .collect();
    symbols.sort();
    symbols.dedup();
    symbols
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
            .map(|(i, &close)| PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close,
                high: close + 0.5,
                low: (close - 0.5).max(0.01),
                close,
                volume: 1000,
            })
            .collect();
        InstrumentSeries::new(symbol, bars).unwrap()
    }

    fn sectors() -> SectorMap {
        let mut map = SectorMap::new();
        map.insert("AAPL", Sector::Technology);
        map.insert("JNJ", Sector::Healthcare);
        map.insert("XOM", Sector::Energy);
        map
    }

    #[test]
    fn mixed_universe_prepares_and_skips() {
        let router = StrategyRouter::default();
        let long: Vec<f64> = (0..260).map(|i| 100.0 + i as f64 * 0.1).collect();
        let short: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.1).collect();

        let universe = vec![
            series_from_closes("AAPL", &long),  // growth, enough history
            series_from_closes("JNJ", &short),  // defensive, enough history
            series_from_closes("XOM", &long),   // avoid sector
            series_from_closes("TINY", &short), // growth (unknown), too short
        ];

        let (prepared, manifest) = prepare_universe(universe, &sectors(), &router).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(manifest.prepared, 2);
        assert_eq!(manifest.skip_count(), 2);

        let reasons: BTreeMap<&str, &str> = manifest
            .skipped
            .iter()
            .map(|s| (s.symbol.as_str(), s.reason.as_str()))
            .collect();
        assert!(reasons["XOM"].contains("sector avoidance"));
        assert!(reasons["TINY"].contains("insufficient history"));
    }

    #[test]
    fn all_skipped_fails_the_batch() {
        let router = StrategyRouter::default();
        let short: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let universe = vec![series_from_closes("XOM", &short)];
        let err = prepare_universe(universe, &sectors(), &router).unwrap_err();
        assert!(matches!(err, BatchError::NothingPrepared { skipped: 1 }));
    }

    #[test]
    fn preserves_input_order() {
        let router = StrategyRouter::default();
        let long: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 0.1).collect();
        let universe = vec![
            series_from_closes("JNJ", &long),
            series_from_closes("ABT", &long),
        ];
        let mut map = sectors();
        map.insert("ABT", Sector::Healthcare);
        let (prepared, _) = prepare_universe(universe, &map, &router).unwrap();
        let symbols: Vec<&str> = prepared.iter().map(|p| p.symbol()).collect();
        assert_eq!(symbols, vec!["JNJ", "ABT"]);
    }

    #[test]
    fn proxy_symbols_unique() {
        let symbols = proxy_symbols();
        assert!(symbols.contains(&"XLK"));
        assert!(symbols.contains(&"XLV"));
        let mut deduped = symbols.clone();
        deduped.dedup();
        assert_eq!(symbols.len(), deduped.len());
    }
}
