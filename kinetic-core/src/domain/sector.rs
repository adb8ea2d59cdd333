//! Sector classification — ticker → sector label, with proxy ETF mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of sector labels seen in the classification metadata.
///
/// A ticker absent from the metadata maps to `Unknown`, which is a routable
/// sector (it gets the growth policy), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Healthcare,
    Energy,
    ConsumerCyclical,
    ConsumerDefensive,
    FinancialServices,
    Industrials,
    Utilities,
    BasicMaterials,
    CommunicationServices,
    RealEstate,
    Etf,
    Unknown,
}

impl Sector {
    /// Parse a metadata label. Unrecognized labels become `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Technology" => Self::Technology,
            "Healthcare" => Self::Healthcare,
            "Energy" => Self::Energy,
            "Consumer Cyclical" => Self::ConsumerCyclical,
            "Consumer Defensive" => Self::ConsumerDefensive,
            "Financial Services" => Self::FinancialServices,
            "Industrials" => Self::Industrials,
            "Utilities" => Self::Utilities,
            "Basic Materials" => Self::BasicMaterials,
            "Communication Services" => Self::CommunicationServices,
            "Real Estate" => Self::RealEstate,
            "ETF" => Self::Etf,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Healthcare => "Healthcare",
            Self::Energy => "Energy",
            Self::ConsumerCyclical => "Consumer Cyclical",
            Self::ConsumerDefensive => "Consumer Defensive",
            Self::FinancialServices => "Financial Services",
            Self::Industrials => "Industrials",
            Self::Utilities => "Utilities",
            Self::BasicMaterials => "Basic Materials",
            Self::CommunicationServices => "Communication Services",
            Self::RealEstate => "Real Estate",
            Self::Etf => "ETF",
            Self::Unknown => "Unknown",
        }
    }

    /// Sector proxy ETF used for the peer-trend filter.
    ///
    /// Sectors without a dedicated proxy fall back to the broad benchmark.
    pub fn proxy_symbol(&self) -> &'static str {
        match self {
            Self::Technology => "XLK",
            Self::Healthcare => "XLV",
            Self::Energy => "XLE",
            Self::ConsumerCyclical => "XLY",
            Self::ConsumerDefensive => "XLP",
            Self::FinancialServices => "XLF",
            Self::Industrials => "XLI",
            Self::Utilities => "XLU",
            Self::BasicMaterials => "XLB",
            Self::CommunicationServices => "XLC",
            Self::RealEstate => "XLRE",
            Self::Etf | Self::Unknown => "SPY",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which family of trading rules an instrument is governed by.
///
/// Selected from the sector label by `strategy::policy_for`; carried on
/// positions and trades so the simulator knows which exit rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyTag {
    Growth,
    Defensive,
    Avoid,
}

impl std::fmt::Display for PolicyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Growth => "Growth",
            Self::Defensive => "Defensive",
            Self::Avoid => "Avoid",
        })
    }
}

/// Uppercase ticker → sector, built once per run from classification metadata.
#[derive(Debug, Clone, Default)]
pub struct SectorMap {
    entries: HashMap<String, Sector>,
}

impl SectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl AsRef<str>, sector: Sector) {
        self.entries
            .insert(symbol.as_ref().to_uppercase(), sector);
    }

    /// Lookup is case-insensitive; absent tickers are `Unknown`.
    pub fn sector_of(&self, symbol: &str) -> Sector {
        self.entries
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(Sector::Unknown)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_roundtrip() {
        for label in [
            "Technology",
            "Consumer Cyclical",
            "Financial Services",
            "Real Estate",
            "ETF",
        ] {
            assert_eq!(Sector::from_label(label).as_str(), label);
        }
    }

    #[test]
    fn unrecognized_label_is_unknown() {
        assert_eq!(Sector::from_label("Cryptocurrency"), Sector::Unknown);
        assert_eq!(Sector::from_label(""), Sector::Unknown);
    }

    #[test]
    fn absent_ticker_is_unknown() {
        let map = SectorMap::new();
        assert_eq!(map.sector_of("ZZZZ"), Sector::Unknown);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut map = SectorMap::new();
        map.insert("aapl", Sector::Technology);
        assert_eq!(map.sector_of("AAPL"), Sector::Technology);
        assert_eq!(map.sector_of("aapl"), Sector::Technology);
    }

    #[test]
    fn proxy_fallback_is_benchmark() {
        assert_eq!(Sector::Unknown.proxy_symbol(), "SPY");
        assert_eq!(Sector::Technology.proxy_symbol(), "XLK");
    }
}
