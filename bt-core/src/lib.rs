//! bt-core — event-driven, bar-based backtesting engine.
//!
//! - Domain types (bars, orders, fills, positions, trades, portfolio, ids)
//! - Execution model (slippage, fees, stop/limit fill rules, exit ratchets)
//! - Position sizing
//! - Streaming indicators
//! - Engine: configuration, the `Strategy` contract, and the four-phase
//!   bar-by-bar event loop, plus synchronous, async, RL-style step, and
//!   multi-asset runners built on it
//! - Results aggregation
//! - Run fingerprinting

pub mod domain;
pub mod engine;
pub mod error;
pub mod execution;
pub mod fingerprint;
pub mod indicators;
pub mod results;
pub mod sizing;
