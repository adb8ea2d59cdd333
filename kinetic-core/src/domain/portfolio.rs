//! Portfolio — cash, open positions, equity curve, trade log.

use super::position::Position;
use super::trade::Trade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One point of the mark-to-market equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Aggregate portfolio state.
///
/// The accounting identity `equity == cash + Σ position market value` must
/// hold at every recorded point; the simulator asserts it per date.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub max_positions: usize,
    pub positions: HashMap<String, Position>,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(initial_capital: f64, max_positions: usize) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            max_positions,
            positions: HashMap::new(),
            equity_curve: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_capacity(&self) -> bool {
        self.positions.len() < self.max_positions
    }

    /// Mark-to-market equity given per-symbol marks.
    ///
    /// A position without a mark falls back to its entry price; the
    /// simulator tracks those fallbacks separately as stale marks.
    pub fn equity(&self, marks: &HashMap<String, f64>) -> f64 {
        let held: f64 = self
            .positions
            .iter()
            .map(|(sym, pos)| {
                let price = marks.get(sym).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + held
    }

    /// Equity values only, for metric functions over `&[f64]`.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
