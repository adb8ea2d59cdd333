//! Volatility bands — SMA ± k·σ, relative width, and squeeze measures.
//!
//! Width is `(upper - lower) / mid`, a scale-free measure of compression.
//! Two normalizations of the width are exposed, both over the same trailing
//! `rank_window` history:
//! - `squeeze_pct`: percentile rank in [0, 1] (entry filter);
//! - `width_norm`: min-max normalization in [0, 1] (the structure axis);
//! plus `width_z`, the z-score of the width (climax exit).

use super::rolling::{minmax_normalize, percentile_rank, rolling_mean, rolling_std, sma};

/// Floor on σ denominators when standardizing the width.
const STD_FLOOR: f64 = 1e-9;

/// Band series for one instrument, all aligned to the input length.
#[derive(Debug, Clone)]
pub struct VolatilityBands {
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    /// `(upper - lower) / mid`.
    pub width: Vec<f64>,
    /// Trailing percentile rank of `width` in [0, 1]; NaN during warm-up.
    pub squeeze_pct: Vec<f64>,
    /// Min-max normalized `width` in [0, 1]; NaN during warm-up.
    pub width_norm: Vec<f64>,
    /// Z-score of `width` against its trailing mean/σ; NaN during warm-up.
    pub width_z: Vec<f64>,
}

/// Compute bands over closes.
///
/// `period` is the averaging window (default 20), `mult` the σ multiplier
/// (default 2), `rank_window` the trailing history used to normalize the
/// width (default 120).
pub fn volatility_bands(
    closes: &[f64],
    period: usize,
    mult: f64,
    rank_window: usize,
) -> VolatilityBands {
    let n = closes.len();
    let mid = sma(closes, period);
    let std = rolling_std(closes, period);

    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    let mut width = vec![f64::NAN; n];
    for i in 0..n {
        if mid[i].is_nan() || std[i].is_nan() {
            continue;
        }
        upper[i] = mid[i] + mult * std[i];
        lower[i] = mid[i] - mult * std[i];
        if mid[i] > STD_FLOOR {
            width[i] = (upper[i] - lower[i]) / mid[i];
        }
    }

    let squeeze_pct = percentile_rank(&width, rank_window);
    let width_norm = minmax_normalize(&width, rank_window);

    let w_mean = rolling_mean(&width, rank_window);
    let w_std = rolling_std(&width, rank_window);
    let mut width_z = vec![f64::NAN; n];
    for i in 0..n {
        if width[i].is_nan() || w_mean[i].is_nan() || w_std[i].is_nan() {
            continue;
        }
        width_z[i] = (width[i] - w_mean[i]) / w_std[i].max(STD_FLOOR);
    }

    VolatilityBands {
        mid,
        upper,
        lower,
        width,
        squeeze_pct,
        width_norm,
        width_z,
    }
}
