//! Position — an open exposure in a single symbol.

use super::bar::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Breakeven-stop state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakevenState {
    pub trigger_pct: f64,
    pub lock_pct: f64,
    pub activated: bool,
}

/// Trailing-stop state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailingState {
    pub trail_pct: f64,
    pub activation_pct: f64,
    /// Highest price since entry (LONG) or lowest (SHORT).
    pub extremum: f64,
    pub activated: bool,
}

/// Partial take-profit state. Fires at most once per position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialTpState {
    pub fraction: f64,
    pub new_tp_pct: f64,
    pub done: bool,
}

/// An open position. Created by the portfolio from a filled order; mutated
/// by the execution model (breakeven, trailing, partial-TP); destroyed when
/// fully closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    /// Size-weighted average entry price across merges.
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub size_usd: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub breakeven: BreakevenState,
    pub trailing: TrailingState,
    pub partial_tp: PartialTpState,
    pub group: Option<String>,
    /// Entry fees paid to date, pro-rated down on partial closes alongside
    /// `size_usd` so a slice's attributable fee stays proportional.
    pub entry_fee: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side.is_long()
    }

    /// Merge additional size into this position at `fill_price`, updating
    /// the size-weighted average entry price. SL/TP anchors are left
    /// unchanged (SPEC_FULL.md §4.2).
    pub fn merge(&mut self, fill_price: f64, additional_size_usd: f64, additional_fee: f64) {
        let total = self.size_usd + additional_size_usd;
        self.entry_price =
            (self.entry_price * self.size_usd + fill_price * additional_size_usd) / total;
        self.size_usd = total;
        self.entry_fee += additional_fee;
    }

    /// Unrealized PnL percent at `price`, from the current entry price.
    pub fn unrealized_pnl_pct(&self, price: f64) -> f64 {
        if self.is_long() {
            (price - self.entry_price) / self.entry_price
        } else {
            (self.entry_price - price) / self.entry_price
        }
    }
}
