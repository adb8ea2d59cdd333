//! Indicator kernels.
//!
//! Pure functions over aligned numeric sequences. Every function returns a
//! vector the same length as its input, left-padded with NaN for
//! "insufficient data" — except the stochastic RSI, which reports a 0.5
//! neutral instead so the oscillator is always defined. No kernel ever
//! emits Inf; all divide-by-zero paths are floored.

pub mod atr;
pub mod bands;
pub mod mcginley;
pub mod rolling;
pub mod stoch_rsi;

pub use atr::{atr, true_range};
pub use bands::{volatility_bands, VolatilityBands};
pub use mcginley::mcginley_dynamic;
pub use rolling::{
    diff, minmax_normalize, percentile_rank, rolling_max, rolling_mean, rolling_min, rolling_std,
    sma,
};
pub use stoch_rsi::stoch_rsi;

/// Build bars from (open, high, low, close) tuples for tests.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PriceBar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
