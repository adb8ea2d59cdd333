//! InstrumentSeries — one instrument's ordered bar history.
//!
//! Derived indicator columns are parallel `Vec<f64>` aligned by index.
//! Misalignment between a derived column and the bar vector corrupts every
//! downstream signal, so every elementwise consumer must call
//! `check_aligned` first; a violation is a programming error and fails the
//! run rather than being truncated away.

use super::bar::PriceBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing a series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("series for '{0}' is empty")]
    Empty(String),
    #[error("series for '{symbol}' is not date-ascending at index {index}")]
    OutOfOrder { symbol: String, index: usize },
    #[error("series for '{symbol}' has duplicate date {date} at index {index}")]
    DuplicateDate {
        symbol: String,
        date: NaiveDate,
        index: usize,
    },
}

/// A derived column whose length does not match the bar vector.
///
/// Fatal by design: silent truncation would shift every later row and
/// introduce look-ahead or look-behind bias.
#[derive(Debug, Error)]
#[error("column '{column}' for '{symbol}' has length {actual}, expected {expected}")]
pub struct AlignmentError {
    pub symbol: String,
    pub column: &'static str,
    pub expected: usize,
    pub actual: usize,
}

/// Ordered, immutable bar history for one ticker symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl InstrumentSeries {
    /// Build a series from bars already sorted ascending by date.
    ///
    /// Rejects empty input, out-of-order dates, and duplicate dates.
    /// Ingestion (`data::ingest`) sorts and deduplicates before calling this.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty(symbol));
        }
        for i in 1..bars.len() {
            if bars[i].date < bars[i - 1].date {
                return Err(SeriesError::OutOfOrder { symbol, index: i });
            }
            if bars[i].date == bars[i - 1].date {
                return Err(SeriesError::DuplicateDate {
                    symbol,
                    date: bars[i].date,
                    index: i,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Index of the bar on exactly `date`, if the instrument traded that day.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Index of the most recent bar at or before `date`.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        match self.bars.binary_search_by_key(&date, |b| b.date) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Guard: a derived column must have exactly one value per bar.
    pub fn check_aligned(&self, column: &'static str, len: usize) -> Result<(), AlignmentError> {
        if len == self.bars.len() {
            Ok(())
        } else {
            Err(AlignmentError {
                symbol: self.symbol.clone(),
                column,
                expected: self.bars.len(),
                actual: len,
            })
        }
    }

    /// A copy truncated to the first `len` bars (history up to an index).
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar {
            date,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(n as i64)
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            InstrumentSeries::new("AAPL", vec![]),
            Err(SeriesError::Empty(_))
        ));
    }

    #[test]
    fn rejects_out_of_order() {
        let bars = vec![bar(day(1), 100.0), bar(day(0), 101.0)];
        assert!(matches!(
            InstrumentSeries::new("AAPL", bars),
            Err(SeriesError::OutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_date() {
        let bars = vec![bar(day(0), 100.0), bar(day(0), 101.0)];
        assert!(matches!(
            InstrumentSeries::new("AAPL", bars),
            Err(SeriesError::DuplicateDate { .. })
        ));
    }

    #[test]
    fn index_lookup() {
        let bars = vec![bar(day(0), 100.0), bar(day(2), 101.0), bar(day(5), 102.0)];
        let s = InstrumentSeries::new("AAPL", bars).unwrap();
        assert_eq!(s.index_of(day(2)), Some(1));
        assert_eq!(s.index_of(day(3)), None);
        assert_eq!(s.index_at_or_before(day(3)), Some(1));
        assert_eq!(s.index_at_or_before(day(6)), Some(2));
        assert_eq!(
            s.index_at_or_before(day(0) - chrono::Duration::days(1)),
            None
        );
    }

    #[test]
    fn alignment_guard() {
        let bars = vec![bar(day(0), 100.0), bar(day(1), 101.0)];
        let s = InstrumentSeries::new("AAPL", bars).unwrap();
        assert!(s.check_aligned("atr", 2).is_ok());
        let err = s.check_aligned("atr", 3).unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.actual, 3);
    }

    #[test]
    fn truncated_copy() {
        let bars = vec![bar(day(0), 100.0), bar(day(1), 101.0), bar(day(2), 102.0)];
        let s = InstrumentSeries::new("AAPL", bars).unwrap();
        let t = s.truncated(2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.last_date(), day(1));
    }
}
