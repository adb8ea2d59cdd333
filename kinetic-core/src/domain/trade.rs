//! Trade — a completed round trip, produced when a position closes.

use super::position::Position;
use super::sector::PolicyTag;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Protective stop (chandelier trail for growth, fixed -5% for defensive).
    Stop,
    /// Profit target reached (defensive +10%).
    Target,
    /// Time / stagnation stop.
    Time,
    /// Overheated climax take-profit (growth).
    Climax,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stop => "Loss (Stop)",
            Self::Target => "Profit (Target)",
            Self::Time => "Stagnation (Time)",
            Self::Climax => "Profit (Climax)",
        })
    }
}

/// A realized round-trip trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub policy: PolicyTag,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    /// Realized return as a fraction of entry price (0.05 = +5%).
    pub pnl_pct: f64,
    pub days_held: i64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Close a position into a trade record.
    pub fn from_exit(
        pos: &Position,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        Self {
            symbol: pos.symbol.clone(),
            policy: pos.policy,
            entry_date: pos.entry_date,
            exit_date,
            entry_price: pos.entry_price,
            exit_price,
            shares: pos.shares,
            pnl_pct: pos.pnl_pct(exit_price),
            days_held: pos.days_held(exit_date),
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_pct > 0.0
    }

    /// Realized dollar profit.
    pub fn pnl_dollars(&self) -> f64 {
        self.shares * (self.exit_price - self.entry_price)
    }
}
