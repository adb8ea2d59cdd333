//! Average True Range — rolling mean of the true range.
//!
//! True range: max(high-low, |high-prev_close|, |low-prev_close|).
//! TR[0] has no previous close and falls back to high-low.

use super::rolling::rolling_mean;
use crate::domain::PriceBar;

/// True range per bar.
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return tr;
    }
    tr[0] = bars[0].high - bars[0].low;
    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// ATR: rolling simple mean of true range over `period` bars.
pub fn atr(bars: &[PriceBar], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(bars), period)
}
