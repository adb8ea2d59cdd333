//! Stochastic RSI — a bounded momentum oscillator in [0, 1].
//!
//! RSI(period) from rolling-mean gains/losses, then min-max normalized
//! against its own trailing `period` window. Neutral default of 0.5
//! wherever the value is undefined (warm-up, zero-variance window), so the
//! oscillator never leaks NaN into signal logic.

use super::rolling::{diff, rolling_max, rolling_mean, rolling_min};

/// Floor on the average-loss denominator.
const LOSS_FLOOR: f64 = 1e-9;

/// Neutral value reported where the oscillator is undefined.
pub const NEUTRAL: f64 = 0.5;

/// Compute stochastic RSI over `closes`.
///
/// `smooth` applies a trailing simple-mean smoothing of that many values
/// (the %K line); pass 1 for the raw oscillator.
pub fn stoch_rsi(closes: &[f64], period: usize, smooth: usize) -> Vec<f64> {
    let n = closes.len();
    assert!(period >= 1, "stoch RSI period must be >= 1");
    assert!(smooth >= 1, "stoch RSI smoothing must be >= 1");
    if n == 0 {
        return Vec::new();
    }

    let rsi = rsi_series(closes, period);
    let min_rsi = rolling_min(&rsi, period);
    let max_rsi = rolling_max(&rsi, period);

    let mut stoch = vec![NEUTRAL; n];
    for i in 0..n {
        let (r, lo, hi) = (rsi[i], min_rsi[i], max_rsi[i]);
        if r.is_nan() || lo.is_nan() || hi.is_nan() {
            continue;
        }
        let range = hi - lo;
        if range > 1e-9 {
            stoch[i] = ((r - lo) / range).clamp(0.0, 1.0);
        }
    }

    if smooth == 1 {
        return stoch;
    }
    let smoothed = rolling_mean(&stoch, smooth);
    smoothed
        .into_iter()
        .map(|v| if v.is_nan() { NEUTRAL } else { v })
        .collect()
}

/// RSI in [0, 100] from rolling simple means of gains and losses.
/// NaN until the first full window of price changes.
fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let delta = diff(closes);
    let n = closes.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        if delta[i].is_nan() {
            continue;
        }
        gains[i] = delta[i].max(0.0);
        losses[i] = (-delta[i]).max(0.0);
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let mut rsi = vec![f64::NAN; n];
    for i in 0..n {
        let (g, l) = (avg_gain[i], avg_loss[i]);
        if g.is_nan() || l.is_nan() {
            continue;
        }
        let rs = g / l.max(LOSS_FLOOR);
        rsi[i] = 100.0 - 100.0 / (1.0 + rs);
    }
    rsi
}
