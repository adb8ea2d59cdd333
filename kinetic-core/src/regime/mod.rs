//! Market regime and peer-trend filters, plus the volatility crisis gauge.
//!
//! Both filters are pure per-date lookups into precomputed moving averages.
//! The asymmetry is deliberate and load-bearing: a missing or warming-up
//! sector proxy yields `Neutral` (non-blocking, so sparse proxy data never
//! starves the system of entries), while a missing benchmark yields
//! `Unknown` (policies decide how conservative to be about whole-market
//! risk).

use crate::domain::{InstrumentSeries, Sector};
use crate::indicators::sma;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Broad-market trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalRegime {
    BullRiskOn,
    BearRiskOff,
    Unknown,
}

impl std::fmt::Display for GlobalRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BullRiskOn => "BULL_RISK_ON",
            Self::BearRiskOff => "BEAR_RISK_OFF",
            Self::Unknown => "UNKNOWN",
        })
    }
}

/// Sector-proxy trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerTrend {
    Up,
    Down,
    /// Missing or insufficient proxy data; treated as non-blocking.
    Neutral,
}

impl std::fmt::Display for PeerTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Neutral => "NEUTRAL",
        })
    }
}

/// Default long moving average for the global regime.
pub const REGIME_MA_PERIOD: usize = 200;
/// Default short moving average for the peer trend.
pub const PEER_MA_PERIOD: usize = 20;

/// Precomputed global regime per benchmark bar date.
#[derive(Debug, Clone)]
pub struct RegimeSeries {
    dates: Vec<NaiveDate>,
    regimes: Vec<GlobalRegime>,
}

impl RegimeSeries {
    /// A regime series with no observations: `Unknown` for every date.
    pub fn unknown() -> Self {
        Self {
            dates: Vec::new(),
            regimes: Vec::new(),
        }
    }

    /// Benchmark close vs its `period`-day SMA; `Unknown` until the SMA
    /// window fills.
    pub fn from_benchmark(benchmark: &InstrumentSeries, period: usize) -> Self {
        let closes = benchmark.closes();
        let ma = sma(&closes, period);
        let regimes = benchmark
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                if ma[i].is_nan() {
                    GlobalRegime::Unknown
                } else if bar.close > ma[i] {
                    GlobalRegime::BullRiskOn
                } else {
                    GlobalRegime::BearRiskOff
                }
            })
            .collect();
        Self {
            dates: benchmark.bars().iter().map(|b| b.date).collect(),
            regimes,
        }
    }

    /// Regime as of `date` (most recent benchmark bar at or before it).
    pub fn at(&self, date: NaiveDate) -> GlobalRegime {
        match self.dates.binary_search(&date) {
            Ok(i) => self.regimes[i],
            Err(0) => GlobalRegime::Unknown,
            Err(i) => self.regimes[i - 1],
        }
    }
}

/// Precomputed peer trend for one sector proxy.
#[derive(Debug, Clone)]
pub struct PeerSeries {
    dates: Vec<NaiveDate>,
    trends: Vec<PeerTrend>,
}

impl PeerSeries {
    /// Proxy close vs its `period`-day SMA; `Neutral` until the window fills.
    pub fn from_proxy(proxy: &InstrumentSeries, period: usize) -> Self {
        let closes = proxy.closes();
        let ma = sma(&closes, period);
        let trends = proxy
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                if ma[i].is_nan() {
                    PeerTrend::Neutral
                } else if bar.close > ma[i] {
                    PeerTrend::Up
                } else {
                    PeerTrend::Down
                }
            })
            .collect();
        Self {
            dates: proxy.bars().iter().map(|b| b.date).collect(),
            trends,
        }
    }

    pub fn at(&self, date: NaiveDate) -> PeerTrend {
        match self.dates.binary_search(&date) {
            Ok(i) => self.trends[i],
            Err(0) => PeerTrend::Neutral,
            Err(i) => self.trends[i - 1],
        }
    }
}

/// Peer-trend lookup across sectors. Sectors without a loaded proxy are
/// always `Neutral`.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    by_sector: HashMap<Sector, PeerSeries>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sector: Sector, series: PeerSeries) {
        self.by_sector.insert(sector, series);
    }

    pub fn trend(&self, sector: Sector, date: NaiveDate) -> PeerTrend {
        self.by_sector
            .get(&sector)
            .map(|s| s.at(date))
            .unwrap_or(PeerTrend::Neutral)
    }
}

/// Volatility-proxy panic gauge: above `level` at the close, all new
/// entries are suspended for the day (existing positions keep their own
/// exit rules).
#[derive(Debug, Clone)]
pub struct CrisisGauge {
    closes: HashMap<NaiveDate, f64>,
    pub level: f64,
}

impl CrisisGauge {
    pub fn new(proxy: &InstrumentSeries, level: f64) -> Self {
        Self {
            closes: proxy.bars().iter().map(|b| (b.date, b.close)).collect(),
            level,
        }
    }

    /// True when the proxy closed above the panic level on `date`.
    /// Missing data is not a panic.
    pub fn panic_on(&self, date: NaiveDate) -> bool {
        self.closes.get(&date).is_some_and(|&c| c > self.level)
    }
}
