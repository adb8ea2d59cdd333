//! Position — an open trade with strategy-specific mutable state.

use super::sector::PolicyTag;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position in one instrument.
///
/// `high_since_entry` is updated every day the position is held and feeds
/// the growth policy's trailing (chandelier) stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: f64,
    /// Dollars committed at entry.
    pub dollar_size: f64,
    pub policy: PolicyTag,
    pub high_since_entry: f64,
}

impl Position {
    pub fn open(
        symbol: impl Into<String>,
        entry_date: NaiveDate,
        entry_price: f64,
        dollar_size: f64,
        policy: PolicyTag,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            entry_date,
            entry_price,
            shares: dollar_size / entry_price,
            dollar_size,
            policy,
            high_since_entry: entry_price,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    /// Unrealized return as a fraction of entry price.
    pub fn pnl_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// Calendar days held as of `date`.
    pub fn days_held(&self, date: NaiveDate) -> i64 {
        (date - self.entry_date).num_days()
    }

    /// Ratchet the trailing high. Never decreases.
    pub fn update_high(&mut self, high: f64) {
        if high.is_finite() && high > self.high_since_entry {
            self.high_since_entry = high;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn open_computes_shares() {
        let pos = Position::open("AAPL", day(0), 200.0, 10_000.0, PolicyTag::Growth);
        assert!((pos.shares - 50.0).abs() < 1e-12);
        assert_eq!(pos.high_since_entry, 200.0);
    }

    #[test]
    fn pnl_and_days() {
        let pos = Position::open("AAPL", day(0), 100.0, 10_000.0, PolicyTag::Defensive);
        assert!((pos.pnl_pct(110.0) - 0.10).abs() < 1e-12);
        assert_eq!(pos.days_held(day(7)), 7);
    }

    #[test]
    fn trailing_high_never_decreases() {
        let mut pos = Position::open("AAPL", day(0), 100.0, 10_000.0, PolicyTag::Growth);
        pos.update_high(120.0);
        pos.update_high(110.0);
        assert_eq!(pos.high_since_entry, 120.0);
        pos.update_high(f64::NAN);
        assert_eq!(pos.high_since_entry, 120.0);
    }
}
