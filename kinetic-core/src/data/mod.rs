//! Ingestion: normalize external JSON payloads into domain types.
//!
//! The concrete fetch mechanics live outside this crate; what is accepted
//! here are the two payload shapes that exist in the wild, normalized into
//! `InstrumentSeries` at the boundary so the engine only ever sees the
//! canonical form.

pub mod classification;
pub mod ingest;

pub use classification::parse_sector_json;
pub use ingest::{parse_ohlcv_json, IngestedSeries};

use thiserror::Error;

/// Errors normalizing external payloads.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed JSON for '{symbol}': {source}")]
    Json {
        symbol: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("columnar payload for '{symbol}': column '{column}' has length {actual}, expected {expected}")]
    ColumnLength {
        symbol: String,
        column: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unparseable date '{raw}' for '{symbol}'")]
    BadDate { symbol: String, raw: String },
    #[error("'{symbol}' has no usable bars after normalization")]
    NoBars { symbol: String },
    #[error(transparent)]
    Series(#[from] crate::domain::SeriesError),
}
