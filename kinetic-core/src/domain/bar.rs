//! PriceBar — one trading day of OHLCV for one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single calendar day.
///
/// Dates are timezone-naive calendar days. Non-trading days simply do not
/// appear in a series; gaps are never interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// OHLC sanity: high >= max(open, close, low), low <= min(open, close, high),
    /// all prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.low > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn sane_bar() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn void_bar_detected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn high_below_low_is_insane() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn zero_price_is_insane() {
        let mut bar = sample_bar();
        bar.low = 0.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let back: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, back);
    }
}
