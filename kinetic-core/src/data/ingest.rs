//! OHLCV normalization for the two historical payload shapes.
//!
//! Shape A (columnar): `{"timestamps": [ms-epoch...], "open": [...], ...}`.
//! Shape B (rows): `[{"time": "YYYY-MM-DD", "open": ..., ...}, ...]`.
//!
//! Normalization sorts ascending, deduplicates dates (last record wins),
//! and drops insane bars with a count, so the engine never sees a
//! duplicate date or an inverted high/low.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::IngestError;
use crate::domain::{InstrumentSeries, PriceBar};

/// A normalized series plus normalization diagnostics.
#[derive(Debug)]
pub struct IngestedSeries {
    pub series: InstrumentSeries,
    /// Bars rejected by the sanity check.
    pub dropped_bars: usize,
    /// Duplicate dates collapsed (last record wins).
    pub duplicate_dates: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Columnar(ColumnarPayload),
    Rows(Vec<RowRecord>),
}

#[derive(Debug, Deserialize)]
struct ColumnarPayload {
    timestamps: Vec<i64>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    #[serde(default)]
    volume: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RowRecord {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse one instrument's OHLCV JSON into a normalized series.
pub fn parse_ohlcv_json(symbol: &str, json: &str) -> Result<IngestedSeries, IngestError> {
    let payload: RawPayload = serde_json::from_str(json).map_err(|source| IngestError::Json {
        symbol: symbol.to_string(),
        source,
    })?;

    let raw_bars = match payload {
        RawPayload::Columnar(cols) => columnar_bars(symbol, cols)?,
        RawPayload::Rows(rows) => row_bars(symbol, rows)?,
    };

    normalize(symbol, raw_bars)
}

fn columnar_bars(symbol: &str, cols: ColumnarPayload) -> Result<Vec<PriceBar>, IngestError> {
    let n = cols.timestamps.len();
    let check = |column: &'static str, len: usize| -> Result<(), IngestError> {
        if len == n {
            Ok(())
        } else {
            Err(IngestError::ColumnLength {
                symbol: symbol.to_string(),
                column,
                expected: n,
                actual: len,
            })
        }
    };
    check("open", cols.open.len())?;
    check("high", cols.high.len())?;
    check("low", cols.low.len())?;
    check("close", cols.close.len())?;
    if let Some(volume) = &cols.volume {
        check("volume", volume.len())?;
    }

    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let date = DateTime::from_timestamp_millis(cols.timestamps[i])
            .map(|dt| dt.date_naive())
            .ok_or_else(|| IngestError::BadDate {
                symbol: symbol.to_string(),
                raw: cols.timestamps[i].to_string(),
            })?;
        bars.push(PriceBar {
            date,
            open: cols.open[i],
            high: cols.high[i],
            low: cols.low[i],
            close: cols.close[i],
            volume: volume_at(&cols.volume, i),
        });
    }
    Ok(bars)
}

fn row_bars(symbol: &str, rows: Vec<RowRecord>) -> Result<Vec<PriceBar>, IngestError> {
    rows.into_iter()
        .map(|row| {
            // Some feeds ship full datetimes; the calendar day prefix is
            // what matters.
            let day_part = row.time.get(..10).unwrap_or(&row.time);
            let date = NaiveDate::parse_from_str(day_part, "%Y-%m-%d").map_err(|_| {
                IngestError::BadDate {
                    symbol: symbol.to_string(),
                    raw: row.time.clone(),
                }
            })?;
            Ok(PriceBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
            })
        })
        .collect()
}

fn volume_at(volume: &Option<Vec<f64>>, i: usize) -> u64 {
    volume
        .as_ref()
        .and_then(|v| v.get(i))
        .map(|&v| if v.is_finite() { v.max(0.0) as u64 } else { 0 })
        .unwrap_or(0)
}

fn normalize(symbol: &str, bars: Vec<PriceBar>) -> Result<IngestedSeries, IngestError> {
    // BTreeMap gives ascending order and last-wins deduplication in one pass.
    let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
    let mut dropped_bars = 0usize;
    let mut kept = 0usize;
    for bar in bars {
        if !bar.is_sane() {
            dropped_bars += 1;
            continue;
        }
        kept += 1;
        by_date.insert(bar.date, bar);
    }
    let duplicate_dates = kept - by_date.len();

    if by_date.is_empty() {
        return Err(IngestError::NoBars {
            symbol: symbol.to_string(),
        });
    }

    let series = InstrumentSeries::new(symbol, by_date.into_values().collect())?;
    Ok(IngestedSeries {
        series,
        dropped_bars,
        duplicate_dates,
    })
}
