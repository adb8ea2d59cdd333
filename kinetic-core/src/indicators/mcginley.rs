//! McGinley dynamic — a price-ratio-driven adaptive trend average.
//!
//! `md[i] = md[i-1] + (close[i] - md[i-1]) / (k * r^4)` with
//! `r = close[i] / md[i-1]` clamped to [0.1, 10].
//!
//! The quartic ratio term is the point of the filter: it tracks faster when
//! price runs away from the average and slower in chop. Downstream
//! thresholds are tuned against this exact recursion, so it must not be
//! approximated by an exponential average.

/// Floor for the previous-average denominator when it collapses to zero.
const DENOM_FLOOR: f64 = 1e-9;

/// Clamp bounds for the price/average ratio, preventing divide explosions
/// on gapped prices.
const RATIO_MIN: f64 = 0.1;
const RATIO_MAX: f64 = 10.0;

/// Compute the McGinley dynamic over `closes` with responsiveness `k`
/// (typical 10-20; smaller tracks tighter).
///
/// `md[0] = closes[0]`; a constant input series is a fixed point (the
/// output equals the input everywhere).
pub fn mcginley_dynamic(closes: &[f64], k: f64) -> Vec<f64> {
    let n = closes.len();
    let mut md = vec![f64::NAN; n];
    if n == 0 {
        return md;
    }
    assert!(k > 0.0, "McGinley responsiveness k must be > 0");

    md[0] = closes[0];
    for i in 1..n {
        let prev = md[i - 1];
        let price = closes[i];
        if !price.is_finite() || !prev.is_finite() {
            // Once the recursion loses a valid previous value it cannot
            // recover without re-seeding; keep the remainder NaN.
            break;
        }
        let denom = if prev.abs() < DENOM_FLOOR {
            DENOM_FLOOR
        } else {
            prev
        };
        let ratio = (price / denom).clamp(RATIO_MIN, RATIO_MAX);
        md[i] = prev + (price - prev) / (k * ratio.powi(4));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn constant_series_is_fixed_point() {
        let closes = vec![42.5; 30];
        let md = mcginley_dynamic(&closes, 14.0);
        for (i, &v) in md.iter().enumerate() {
            assert_approx(v, 42.5, DEFAULT_EPSILON);
            assert!(!v.is_nan(), "NaN at {i}");
        }
    }

    #[test]
    fn seeds_from_first_close() {
        let md = mcginley_dynamic(&[123.0, 125.0], 14.0);
        assert_approx(md[0], 123.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lags_below_a_rising_series() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let md = mcginley_dynamic(&closes, 14.0);
        for i in 1..closes.len() {
            assert!(md[i] < closes[i], "average should lag price at {i}");
            assert!(md[i] > md[i - 1], "average should still rise at {i}");
        }
    }

    #[test]
    fn ratio_clamp_survives_price_gap() {
        // 100x gap up: unclamped r^4 would freeze the filter entirely.
        let md = mcginley_dynamic(&[1.0, 100.0, 100.0, 100.0], 10.0);
        for &v in &md {
            assert!(v.is_finite());
        }
        // With r clamped to 10, the first post-gap step is
        // 1 + 99 / (10 * 10^4) = 1.00099.
        assert_approx(md[1], 1.0 + 99.0 / 100_000.0, 1e-9);
    }

    #[test]
    fn stays_within_input_envelope() {
        let closes = [100.0, 104.0, 98.0, 103.0, 99.0, 105.0, 101.0];
        let md = mcginley_dynamic(&closes, 12.0);
        let lo = closes.iter().copied().fold(f64::MAX, f64::min);
        let hi = closes.iter().copied().fold(f64::MIN, f64::max);
        for &v in &md {
            assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }

    #[test]
    fn nan_input_truncates_tail() {
        let md = mcginley_dynamic(&[100.0, 101.0, f64::NAN, 103.0], 14.0);
        assert!(!md[1].is_nan());
        assert!(md[2].is_nan());
        assert!(md[3].is_nan());
    }

    #[test]
    fn empty_input() {
        assert!(mcginley_dynamic(&[], 14.0).is_empty());
    }
}
