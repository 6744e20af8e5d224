//! Execution model: slippage, fees, gap protection, breakeven/trailing ratchet.
//!
//! Stateless configuration consulted by the bar processor and the
//! portfolio. Grounded on the reference engine's `execution.py`, extended
//! with the trailing-stop ratchet the reference version left unimplemented
//! even though `Position` already carries the trailing fields.

use crate::domain::bar::{Bar, Side};
use crate::domain::position::Position;
use crate::domain::trade::ExitReason;
use serde::{Deserialize, Serialize};

/// Realistic order execution: adverse slippage, taker/maker fees, gap
/// protection on exits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutionModel {
    /// Slippage per side, as a decimal fraction (0.0002 = 0.02%).
    pub slippage: f64,
    pub taker_fee: f64,
    pub maker_fee: f64,
}

impl Default for ExecutionModel {
    fn default() -> Self {
        Self {
            slippage: 0.0002,
            taker_fee: 0.00015,
            maker_fee: 0.0,
        }
    }
}

impl ExecutionModel {
    /// Adverse slippage on entry: LONG pays more, SHORT receives less.
    pub fn apply_entry_slippage(&self, price: f64, side: Side) -> f64 {
        match side {
            Side::Long => price * (1.0 + self.slippage),
            Side::Short => price * (1.0 - self.slippage),
        }
    }

    /// Adverse slippage on exit: LONG receives less, SHORT pays more.
    pub fn apply_exit_slippage(&self, price: f64, side: Side) -> f64 {
        match side {
            Side::Long => price * (1.0 - self.slippage),
            Side::Short => price * (1.0 + self.slippage),
        }
    }

    pub fn calc_fee(&self, size_usd: f64, is_maker: bool) -> f64 {
        let rate = if is_maker { self.maker_fee } else { self.taker_fee };
        size_usd * rate
    }

    /// Run the per-bar exit check against an open position.
    ///
    /// Mutates `pos` in place to apply breakeven activation and the
    /// trailing-stop ratchet (step 1-2 below), then evaluates whether the
    /// position should exit this bar (step 3-4). Returns the raw exit
    /// price (pre-slippage) and reason, or `None` if the position survives
    /// the bar.
    ///
    /// Order of checks, per SPEC_FULL.md §4.1:
    /// 1. Update breakeven.
    /// 2. Update trailing stop (ratchet only).
    /// 3. Gap protection (open already past a level) — SL before TP.
    /// 4. Intrabar crossing — SL before TP.
    pub fn check_exit(&self, pos: &mut Position, bar: &Bar) -> Option<(f64, ExitReason)> {
        self.update_breakeven(pos, bar);
        self.update_trailing(pos, bar);

        let open = bar.open;
        let high = bar.high;
        let low = bar.low;

        if pos.is_long() {
            if open <= pos.stop_loss {
                return Some((open, self.gap_stop_reason(pos)));
            }
            if low <= pos.stop_loss {
                return Some((pos.stop_loss, self.intrabar_stop_reason(pos)));
            }
            if open >= pos.take_profit {
                return Some((open, ExitReason::TakeProfitGap));
            }
            if high >= pos.take_profit {
                return Some((pos.take_profit, ExitReason::TakeProfit));
            }
        } else {
            if open >= pos.stop_loss {
                return Some((open, self.gap_stop_reason(pos)));
            }
            if high >= pos.stop_loss {
                return Some((pos.stop_loss, self.intrabar_stop_reason(pos)));
            }
            if open <= pos.take_profit {
                return Some((open, ExitReason::TakeProfitGap));
            }
            if low <= pos.take_profit {
                return Some((pos.take_profit, ExitReason::TakeProfit));
            }
        }
        None
    }

    fn gap_stop_reason(&self, pos: &Position) -> ExitReason {
        if pos.trailing.activated {
            ExitReason::TrailingStopGap
        } else if pos.breakeven.activated {
            ExitReason::BreakevenGap
        } else {
            ExitReason::StopLossGap
        }
    }

    fn intrabar_stop_reason(&self, pos: &Position) -> ExitReason {
        if pos.trailing.activated {
            ExitReason::TrailingStop
        } else if pos.breakeven.activated {
            ExitReason::Breakeven
        } else {
            ExitReason::StopLoss
        }
    }

    fn update_breakeven(&self, pos: &mut Position, bar: &Bar) {
        if pos.breakeven.activated || pos.breakeven.trigger_pct <= 0.0 {
            return;
        }
        let move_pct = if pos.is_long() {
            (bar.high - pos.entry_price) / pos.entry_price
        } else {
            (pos.entry_price - bar.low) / pos.entry_price
        };
        if move_pct >= pos.breakeven.trigger_pct {
            pos.stop_loss = if pos.is_long() {
                pos.entry_price * (1.0 + pos.breakeven.lock_pct)
            } else {
                pos.entry_price * (1.0 - pos.breakeven.lock_pct)
            };
            pos.breakeven.activated = true;
        }
    }

    /// Ratchet the trailing stop toward the extremum since entry. Never
    /// loosens the stop-loss: the proposed level is combined with the
    /// current stop via `max` (LONG) / `min` (SHORT).
    fn update_trailing(&self, pos: &mut Position, bar: &Bar) {
        if pos.trailing.trail_pct <= 0.0 {
            return;
        }

        if pos.is_long() {
            pos.trailing.extremum = pos.trailing.extremum.max(bar.high);
        } else {
            pos.trailing.extremum = if pos.trailing.extremum == 0.0 {
                bar.low
            } else {
                pos.trailing.extremum.min(bar.low)
            };
        }

        if !pos.trailing.activated {
            let gain = pos.unrealized_pnl_pct(pos.trailing.extremum);
            if gain < pos.trailing.activation_pct {
                return;
            }
            pos.trailing.activated = true;
        }

        let proposed = if pos.is_long() {
            pos.trailing.extremum * (1.0 - pos.trailing.trail_pct)
        } else {
            pos.trailing.extremum * (1.0 + pos.trailing.trail_pct)
        };

        pos.stop_loss = if pos.is_long() {
            pos.stop_loss.max(proposed)
        } else {
            pos.stop_loss.min(proposed)
        };
    }

    /// LONG fills when `low <= limit_price`; SHORT when `high >= limit_price`.
    pub fn check_limit_fill(&self, limit_price: f64, side: Side, bar: &Bar) -> bool {
        match side {
            Side::Long => bar.low <= limit_price,
            Side::Short => bar.high >= limit_price,
        }
    }

    /// The price a filled limit order executes at: the limit price, unless
    /// the bar opened already past it in the favorable direction (then the
    /// open, i.e. gap-through).
    pub fn limit_fill_price(&self, limit_price: f64, side: Side, bar: &Bar) -> f64 {
        match side {
            Side::Long if bar.open < limit_price => bar.open,
            Side::Short if bar.open > limit_price => bar.open,
            _ => limit_price,
        }
    }

    /// LONG triggers when `high >= stop_price`; SHORT when `low <= stop_price`.
    pub fn check_stop_trigger(&self, stop_price: f64, side: Side, bar: &Bar) -> bool {
        match side {
            Side::Long => bar.high >= stop_price,
            Side::Short => bar.low <= stop_price,
        }
    }

    /// The raw (pre-slippage) price a triggered stop order fires at: the
    /// stop price, unless the bar opened already past it (gap-through).
    pub fn stop_trigger_price(&self, stop_price: f64, side: Side, bar: &Bar) -> f64 {
        match side {
            Side::Long if bar.open >= stop_price => bar.open,
            Side::Short if bar.open <= stop_price => bar.open,
            _ => stop_price,
        }
    }
}
