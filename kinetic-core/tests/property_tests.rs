//! Property tests for the indicator kernels and the state engine.

use chrono::NaiveDate;
use kinetic_core::domain::{InstrumentSeries, PriceBar};
use kinetic_core::indicators::{mcginley_dynamic, minmax_normalize, percentile_rank, stoch_rsi};
use kinetic_core::state::{analyze, StateParams};
use proptest::prelude::*;

/// Bounded-step price walks: consecutive ratios stay in [0.95, 1.05], the
/// regime where the McGinley step never overshoots its target price.
fn walk_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.95f64..1.05, 30..150).prop_map(|mults| {
        let mut price = 100.0;
        mults
            .into_iter()
            .map(|m| {
                price *= m;
                price
            })
            .collect()
    })
}

fn series_from_closes(closes: &[f64]) -> InstrumentSeries {
    let base_date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1000,
            }
        })
        .collect();
    InstrumentSeries::new("PROP", bars).unwrap()
}

proptest! {
    /// Constant input is a fixed point of the adaptive average: the ratio
    /// stays 1 and the increment stays 0.
    #[test]
    fn mcginley_constant_series_identity(value in 1.0f64..500.0, n in 3usize..80) {
        let closes = vec![value; n];
        let md = mcginley_dynamic(&closes, 14.0);
        for &v in &md {
            prop_assert!((v - value).abs() < 1e-9);
        }
    }

    /// For bounded-step walks the average stays finite and inside the
    /// envelope of observed prices.
    #[test]
    fn mcginley_stays_in_price_envelope(closes in walk_strategy()) {
        let md = mcginley_dynamic(&closes, 14.0);
        let lo = closes.iter().copied().fold(f64::MAX, f64::min);
        let hi = closes.iter().copied().fold(f64::MIN, f64::max);
        for &v in &md {
            prop_assert!(v.is_finite());
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }

    #[test]
    fn stoch_rsi_always_in_unit_interval(closes in walk_strategy(), smooth in 1usize..4) {
        let out = stoch_rsi(&closes, 14, smooth);
        prop_assert_eq!(out.len(), closes.len());
        for &v in &out {
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn rank_and_minmax_stay_normalized(closes in walk_strategy(), period in 2usize..20) {
        for v in percentile_rank(&closes, period) {
            if !v.is_nan() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
        for v in minmax_normalize(&closes, period) {
            if !v.is_nan() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    /// Coordinates are always defined, bounded, and deterministic.
    #[test]
    fn state_coordinates_bounded_and_idempotent(closes in walk_strategy()) {
        let series = series_from_closes(&closes);
        let params = StateParams::default();

        let a = analyze(&series, &params).unwrap();
        let b = analyze(&series, &params).unwrap();
        prop_assert_eq!(a.len(), series.len());

        for (s1, s2) in a.iter().zip(&b) {
            prop_assert!((-3.0..=3.0).contains(&s1.x_trend));
            prop_assert!((0.0..=1.0).contains(&s1.y_momentum));
            prop_assert!((0.0..=1.0).contains(&s1.z_structure));

            prop_assert_eq!(s1.x_trend.to_bits(), s2.x_trend.to_bits());
            prop_assert_eq!(s1.y_momentum.to_bits(), s2.y_momentum.to_bits());
            prop_assert_eq!(s1.z_structure.to_bits(), s2.z_structure.to_bits());
            prop_assert_eq!(s1.tag, s2.tag);
        }
    }
}
