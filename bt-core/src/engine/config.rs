//! Engine configuration — the inputs a Backtest Runner resets state from
//! and hands to `Strategy::configure` before the first bar.

use crate::execution::ExecutionModel;
use crate::indicators::IndicatorSpec;
use serde::{Deserialize, Serialize};

/// Declares one indicator the engine should maintain, under the name a
/// strategy will look it up by in the indicator snapshot.
pub type IndicatorDeclaration = (String, IndicatorSpec);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Used when an order omits an explicit sizer and `size_usd`.
    pub default_position_size_usd: f64,
    /// Position count ceiling per group.
    pub max_positions: usize,
    pub same_direction_only: bool,
    pub execution: ExecutionModel,
    pub indicators: Vec<IndicatorDeclaration>,
    /// Skip `on_bar` for a bar that just closed a position. Default true:
    /// a strategy reacting to its own close would otherwise see a
    /// same-bar re-entry signal that live trading could never act on.
    pub skip_signal_on_close: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            default_position_size_usd: 1_000.0,
            max_positions: 1,
            same_direction_only: false,
            execution: ExecutionModel::default(),
            indicators: Vec::new(),
            skip_signal_on_close: true,
        }
    }
}
