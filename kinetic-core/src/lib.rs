//! Kinetic Core — signal engine and portfolio simulator.
//!
//! This crate contains the heart of the research pipeline:
//! - Domain types (bars, series, sectors, positions, trades, portfolio)
//! - Indicator kernels (McGinley dynamic, stochastic RSI, volatility
//!   bands, ATR, rolling helpers)
//! - Kinetic state engine (trend / momentum / structure coordinates)
//! - Regime and peer-trend filters plus the volatility crisis gauge
//! - Strategy policies (growth breakout, defensive mean-reversion) and
//!   sector routing
//! - The date-ordered portfolio event loop
//! - JSON ingestion for the two historical payload shapes

pub mod data;
pub mod domain;
pub mod indicators;
pub mod regime;
pub mod sim;
pub mod state;
pub mod strategy;
