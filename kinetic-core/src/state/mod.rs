//! Kinetic state — three standardized coordinates per bar plus a
//! categorical tag and human-readable commentary.
//!
//! The coordinates are path-dependent (they need 50-250 bars of history),
//! so the engine always runs over the full available series in order. The
//! per-row classification itself is stateless and ordered: first matching
//! rule wins.

use crate::domain::{AlignmentError, InstrumentSeries};
use crate::indicators::{
    diff, mcginley_dynamic, rolling_mean, rolling_std, stoch_rsi, volatility_bands,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Classification thresholds.
///
/// These are empirically tuned values, kept as data rather than literals;
/// the trend-entry threshold in particular has drifted between 0.5 and 0.6
/// across tuning passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// z above this (with positive x) is a breakout setup.
    pub launchpad_z: f64,
    /// x above this qualifies as an established uptrend for dip entries.
    pub trend_entry_x: f64,
    /// y below this is oversold.
    pub dip_momentum_y: f64,
    /// x above this (with y above `run_y`) is a momentum run.
    pub run_x: f64,
    pub run_y: f64,
    /// x below this is a downtrend.
    pub avoid_x: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            launchpad_z: 0.8,
            trend_entry_x: 0.5,
            dip_momentum_y: 0.2,
            run_x: 1.0,
            run_y: 0.9,
            avoid_x: -0.5,
        }
    }
}

/// Parameters for the state computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateParams {
    /// McGinley responsiveness constant.
    pub mcginley_k: f64,
    pub stoch_period: usize,
    pub stoch_smooth: usize,
    pub band_period: usize,
    pub band_mult: f64,
    /// Trailing window for width normalization.
    pub rank_window: usize,
    /// Trailing window for standardizing the trend slope.
    pub slope_window: usize,
    pub thresholds: SignalThresholds,
}

impl Default for StateParams {
    fn default() -> Self {
        Self {
            mcginley_k: 20.0,
            stoch_period: 14,
            stoch_smooth: 1,
            band_period: 20,
            band_mult: 2.0,
            rank_window: 120,
            slope_window: 50,
            thresholds: SignalThresholds::default(),
        }
    }
}

/// Categorical state tag, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateTag {
    /// Tight compression with positive trend: breakout setup forming.
    Launchpad,
    /// Pullback within an established uptrend — the highest-expectancy entry.
    DipBuy,
    /// Strong trend, overbought: hold, do not add, do not sell.
    MomentumRun,
    /// Downtrend.
    Avoid,
    /// Noise.
    Wait,
    /// Not enough history to compute the coordinates.
    NoData,
}

impl std::fmt::Display for StateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Launchpad => "LAUNCHPAD",
            Self::DipBuy => "DIP_BUY",
            Self::MomentumRun => "MOMENTUM_RUN",
            Self::Avoid => "AVOID",
            Self::Wait => "WAIT",
            Self::NoData => "NO_DATA",
        })
    }
}

/// Per-date kinetic state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KineticState {
    pub date: NaiveDate,
    pub close: f64,
    /// Standardized trend acceleration, clipped to [-3, 3].
    pub x_trend: f64,
    /// Bounded momentum oscillator in [0, 1].
    pub y_momentum: f64,
    /// Structural compression in [0, 1]; high = tight squeeze.
    pub z_structure: f64,
    pub tag: StateTag,
    pub commentary: String,
}

/// Standardized McGinley slope: z-score of the first difference over a
/// trailing `window`, clipped to [-3, 3]; 0.0 where undefined.
pub fn trend_coordinate(closes: &[f64], k: f64, window: usize) -> Vec<f64> {
    let md = mcginley_dynamic(closes, k);
    let slope = diff(&md);
    let mean = rolling_mean(&slope, window);
    let std = rolling_std(&slope, window);

    let mut x = vec![0.0; closes.len()];
    for i in 0..closes.len() {
        if slope[i].is_nan() || mean[i].is_nan() || std[i].is_nan() {
            continue;
        }
        x[i] = ((slope[i] - mean[i]) / std[i].max(1e-9)).clamp(-3.0, 3.0);
    }
    x
}

/// Run the state engine over a full series.
///
/// Deterministic and idempotent; the state at index `i` depends only on
/// bars `0..=i`.
pub fn analyze(
    series: &InstrumentSeries,
    params: &StateParams,
) -> Result<Vec<KineticState>, AlignmentError> {
    let closes = series.closes();

    let md = mcginley_dynamic(&closes, params.mcginley_k);
    let x = trend_coordinate(&closes, params.mcginley_k, params.slope_window);
    let y = stoch_rsi(&closes, params.stoch_period, params.stoch_smooth);
    let bands = volatility_bands(
        &closes,
        params.band_period,
        params.band_mult,
        params.rank_window,
    );

    series.check_aligned("mcginley", md.len())?;
    series.check_aligned("x_trend", x.len())?;
    series.check_aligned("y_momentum", y.len())?;
    series.check_aligned("band_width_norm", bands.width_norm.len())?;

    let mut states = Vec::with_capacity(series.len());
    for (i, bar) in series.bars().iter().enumerate() {
        let z = if bands.width_norm[i].is_nan() {
            0.0
        } else {
            (1.0 - bands.width_norm[i]).clamp(0.0, 1.0)
        };

        let tag = if i + 1 < params.band_period {
            StateTag::NoData
        } else {
            classify(x[i], y[i], z, &params.thresholds)
        };

        states.push(KineticState {
            date: bar.date,
            close: bar.close,
            x_trend: x[i],
            y_momentum: y[i],
            z_structure: z,
            tag,
            commentary: commentary(tag, x[i], y[i], z, bar.close, md[i]),
        });
    }
    Ok(states)
}

/// Ordered classification — first match wins.
fn classify(x: f64, y: f64, z: f64, t: &SignalThresholds) -> StateTag {
    if z > t.launchpad_z && x > 0.0 {
        StateTag::Launchpad
    } else if x > t.trend_entry_x && y < t.dip_momentum_y {
        StateTag::DipBuy
    } else if x > t.run_x && y > t.run_y {
        StateTag::MomentumRun
    } else if x < t.avoid_x {
        StateTag::Avoid
    } else {
        StateTag::Wait
    }
}

fn commentary(tag: StateTag, x: f64, y: f64, z: f64, close: f64, mcginley: f64) -> String {
    match tag {
        StateTag::Launchpad => format!(
            "Volatility squeeze detected (Z={z:.2}). Market structure is coiling \
             for a potential move. Monitor for a breakout above recent highs."
        ),
        StateTag::DipBuy => format!(
            "PRIMARY SETUP: strong trend (X={x:.2}) with oversold momentum \
             (Y={y:.2}). Statistically the highest win-rate entry."
        ),
        StateTag::MomentumRun => format!(
            "Trend is accelerating (X={x:.2}). Do not sell; trail the stop to \
             capture the run. Do not add new positions."
        ),
        StateTag::Avoid => {
            let status = if mcginley.is_finite() && close > mcginley {
                "BULLISH"
            } else {
                "BEARISH"
            };
            format!("Trend is down (X={x:.2}). Price is below dynamic support ({status}).")
        }
        StateTag::Wait => {
            "Market is incoherent or chopping. Capital preservation is the priority.".to_string()
        }
        StateTag::NoData => "Insufficient history to compute the kinetic state.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;

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
                    high: open.max(close) + 1.0,
                    low: (open.min(close) - 1.0).max(0.01),
                    close,
                    volume: 1000,
                }
            })
            .collect();
        InstrumentSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn classification_priority_order() {
        let t = SignalThresholds::default();
        // Launchpad wins over dip even when both would match.
        assert_eq!(classify(0.6, 0.1, 0.9, &t), StateTag::Launchpad);
        assert_eq!(classify(0.6, 0.1, 0.5, &t), StateTag::DipBuy);
        assert_eq!(classify(1.5, 0.95, 0.5, &t), StateTag::MomentumRun);
        assert_eq!(classify(-1.0, 0.5, 0.5, &t), StateTag::Avoid);
        assert_eq!(classify(0.0, 0.5, 0.5, &t), StateTag::Wait);
    }

    #[test]
    fn negative_trend_never_launchpad() {
        let t = SignalThresholds::default();
        assert_eq!(classify(-0.1, 0.5, 0.95, &t), StateTag::Wait);
    }

    #[test]
    fn warmup_rows_are_no_data() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let states = analyze(&series_from_closes(&closes), &StateParams::default()).unwrap();
        for s in &states[..19] {
            assert_eq!(s.tag, StateTag::NoData);
        }
        assert_ne!(states[19].tag, StateTag::NoData);
    }

    #[test]
    fn coordinates_bounded() {
        let closes: Vec<f64> = (0..300)
            .map(|i| 100.0 + i as f64 * 0.2 + 6.0 * (i as f64 * 0.45).sin())
            .collect();
        let states = analyze(&series_from_closes(&closes), &StateParams::default()).unwrap();
        for s in &states {
            assert!((-3.0..=3.0).contains(&s.x_trend));
            assert!((0.0..=1.0).contains(&s.y_momentum));
            assert!((0.0..=1.0).contains(&s.z_structure));
        }
    }

    #[test]
    fn analyze_is_idempotent() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + 5.0 * (i as f64 * 0.21).sin() + i as f64 * 0.05)
            .collect();
        let series = series_from_closes(&closes);
        let params = StateParams::default();
        let a = analyze(&series, &params).unwrap();
        let b = analyze(&series, &params).unwrap();
        for (s1, s2) in a.iter().zip(&b) {
            assert_eq!(s1.x_trend.to_bits(), s2.x_trend.to_bits());
            assert_eq!(s1.y_momentum.to_bits(), s2.y_momentum.to_bits());
            assert_eq!(s1.z_structure.to_bits(), s2.z_structure.to_bits());
            assert_eq!(s1.tag, s2.tag);
        }
    }

    #[test]
    fn squeeze_after_long_compression_tags_launchpad() {
        // Volatile rise, then a long gently-accelerating drift: width
        // compresses while the trend slope keeps making fresh window highs.
        let mut closes: Vec<f64> = (0..160)
            .map(|i| 100.0 + i as f64 * 0.3 + 6.0 * (i as f64 * 0.6).sin())
            .collect();
        let base = *closes.last().unwrap();
        for i in 0..60 {
            let t = i as f64;
            closes.push(base + t * 0.3 + t * t * 0.0005);
        }
        let states = analyze(&series_from_closes(&closes), &StateParams::default()).unwrap();
        let last = states.last().unwrap();
        assert!(last.z_structure > 0.8, "z={}", last.z_structure);
        assert_eq!(last.tag, StateTag::Launchpad);
    }

    #[test]
    fn commentary_mentions_tag_context() {
        let t = SignalThresholds::default();
        let tag = classify(0.9, 0.1, 0.5, &t);
        let text = commentary(tag, 0.9, 0.1, 0.5, 100.0, 95.0);
        assert!(text.contains("PRIMARY SETUP"));
        assert!(text.contains("X=0.90"));
    }
}
