//! Portfolio — open positions, recorded history, equity accounting.

use super::bar::{Bar, Side};
use super::fill::Fill;
use super::ids::IdGen;
use super::order::OrderParams;
use super::position::{BreakevenState, PartialTpState, Position, TrailingState};
use super::trade::{ExitReason, TradeRecord};
use crate::execution::ExecutionModel;
use crate::sizing::PositionSizer;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const UNGROUPED: &str = "__ungrouped__";

fn group_key(group: &Option<String>) -> &str {
    group.as_deref().unwrap_or(UNGROUPED)
}

/// Resolve the absolute stop-loss price from an entry price and an optional
/// percentage. Unset maps to a sentinel that an intrabar check can never
/// reach (0.0 below a LONG entry, infinity above a SHORT entry).
fn derive_stop_loss(side: Side, price: f64, pct: Option<f64>) -> f64 {
    match (side, pct) {
        (Side::Long, Some(p)) => price * (1.0 - p),
        (Side::Short, Some(p)) => price * (1.0 + p),
        (Side::Long, None) => 0.0,
        (Side::Short, None) => f64::INFINITY,
    }
}

fn derive_take_profit(side: Side, price: f64, pct: Option<f64>) -> f64 {
    match (side, pct) {
        (Side::Long, Some(p)) => price * (1.0 + p),
        (Side::Short, Some(p)) => price * (1.0 - p),
        (Side::Long, None) => f64::INFINITY,
        (Side::Short, None) => 0.0,
    }
}

/// Aggregate portfolio state: open positions (grouped for independent
/// count/direction enforcement), fill and trade history, and equity curve.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: Vec<Position>,
    pub fills: Vec<Fill>,
    pub trades: Vec<TradeRecord>,
    pub total_fees: f64,
    /// Position count ceiling, per group. Exposure-cap enforcement may
    /// temporarily clamp this lower; the processor restores it after the bar.
    pub max_positions: usize,
    pub same_direction_only: bool,
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
    pub peak_equity: f64,
    pub max_drawdown_pct: f64,
    last_price: HashMap<String, f64>,
    ids: IdGen,
}

impl Portfolio {
    pub fn new(initial_capital: f64, max_positions: usize, same_direction_only: bool) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            positions: Vec::new(),
            fills: Vec::new(),
            trades: Vec::new(),
            total_fees: 0.0,
            max_positions,
            same_direction_only,
            equity_curve: Vec::new(),
            peak_equity: initial_capital,
            max_drawdown_pct: 0.0,
            last_price: HashMap::new(),
            ids: IdGen::default(),
        }
    }

    pub fn positions_in_group(&self, group: &Option<String>) -> usize {
        let key = group_key(group);
        self.positions
            .iter()
            .filter(|p| group_key(&p.group) == key)
            .count()
    }

    /// True iff the group has room for another position under the current
    /// (possibly exposure-cap-clamped) `max_positions`.
    pub fn can_open(&self, group: &Option<String>) -> bool {
        self.positions_in_group(group) < self.max_positions
    }

    /// True iff `same_direction_only` is set and the group already holds a
    /// position on the opposite side.
    pub fn direction_conflict(&self, group: &Option<String>, side: Side) -> bool {
        if !self.same_direction_only {
            return false;
        }
        let key = group_key(group);
        self.positions
            .iter()
            .any(|p| group_key(&p.group) == key && p.side != side)
    }

    fn most_recent_in_group(&self, group: &Option<String>) -> Option<usize> {
        let key = group_key(group);
        self.positions
            .iter()
            .enumerate()
            .rev()
            .find(|(_, p)| group_key(&p.group) == key)
            .map(|(idx, _)| idx)
    }

    /// Track the latest traded price for a symbol, used for mark-to-market
    /// equity between trade events.
    pub fn update_price(&mut self, symbol: &str, price: f64) {
        self.last_price.insert(symbol.to_string(), price);
    }

    /// Cash plus unrealized PnL of every open position, marked at the last
    /// known price (falling back to entry price if no bar has been seen yet).
    pub fn equity(&self) -> f64 {
        let unrealized: f64 = self
            .positions
            .iter()
            .map(|p| {
                let price = self.last_price.get(&p.symbol).copied().unwrap_or(p.entry_price);
                p.size_usd * p.unrealized_pnl_pct(price)
            })
            .sum();
        self.cash + unrealized
    }

    /// Sample the equity curve and update peak/drawdown. Called from
    /// `close_position`, once per trade close, rather than once per bar:
    /// sampling on mark-to-market equity every bar would mix intrabar
    /// noise into drawdown and populate the curve even when nothing trades.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>) {
        let eq = self.equity();
        self.equity_curve.push((timestamp, eq));
        self.peak_equity = self.peak_equity.max(eq);
        let drawdown = if self.peak_equity > 0.0 {
            (self.peak_equity - eq) / self.peak_equity
        } else {
            0.0
        };
        self.max_drawdown_pct = self.max_drawdown_pct.max(drawdown);
    }

    fn resolve_size(
        &self,
        sizer: &dyn PositionSizer,
        side: Side,
        price: f64,
        symbol: &str,
        params: &OrderParams,
    ) -> f64 {
        params
            .size_usd
            .unwrap_or_else(|| sizer.size(self.equity(), side, price, symbol, params.stop_loss_pct))
    }

    /// Open a brand-new position from a filled entry order.
    #[allow(clippy::too_many_arguments)]
    pub fn open_position(
        &mut self,
        exec: &ExecutionModel,
        sizer: &dyn PositionSizer,
        bar: &Bar,
        side: Side,
        params: &OrderParams,
        raw_price: f64,
        apply_slippage: bool,
        is_maker: bool,
    ) -> Fill {
        let price = if apply_slippage {
            exec.apply_entry_slippage(raw_price, side)
        } else {
            raw_price
        };
        let size_usd = self.resolve_size(sizer, side, price, &bar.symbol, params);
        let fee = exec.calc_fee(size_usd, is_maker);

        let position = Position {
            symbol: bar.symbol.clone(),
            side,
            entry_price: price,
            entry_time: bar.timestamp,
            size_usd,
            stop_loss: derive_stop_loss(side, price, params.stop_loss_pct),
            take_profit: derive_take_profit(side, price, params.take_profit_pct),
            breakeven: BreakevenState {
                trigger_pct: params.breakeven_trigger_pct.unwrap_or(0.0),
                lock_pct: params.breakeven_lock_pct.unwrap_or(0.0),
                activated: false,
            },
            trailing: TrailingState {
                trail_pct: params.trailing_pct.unwrap_or(0.0),
                activation_pct: params.trailing_activation_pct.unwrap_or(0.0),
                extremum: price,
                activated: false,
            },
            partial_tp: PartialTpState {
                fraction: params.partial_tp_pct.unwrap_or(0.0),
                new_tp_pct: params.partial_tp_new_tp_pct.unwrap_or(0.0),
                done: false,
            },
            group: params.group.clone(),
            entry_fee: fee,
        };
        self.positions.push(position);

        let fill = Fill {
            id: self.ids.next_fill_id(),
            timestamp: bar.timestamp,
            symbol: bar.symbol.clone(),
            side,
            price,
            size_usd,
            fee,
            is_entry: true,
            reason: None,
        };
        self.fills.push(fill.clone());
        self.total_fees += fee;
        self.cash -= fee;
        fill
    }

    /// Merge size into the most-recently-opened position in `group`.
    /// Returns `None` if no such position exists — the caller is
    /// responsible for leaving the order pending in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn merge_into_position(
        &mut self,
        exec: &ExecutionModel,
        sizer: &dyn PositionSizer,
        bar: &Bar,
        side: Side,
        group: &Option<String>,
        params: &OrderParams,
        raw_price: f64,
        apply_slippage: bool,
        is_maker: bool,
    ) -> Option<Fill> {
        let idx = self.most_recent_in_group(group)?;
        let price = if apply_slippage {
            exec.apply_entry_slippage(raw_price, side)
        } else {
            raw_price
        };
        let size_usd = self.resolve_size(sizer, side, price, &bar.symbol, params);
        let fee = exec.calc_fee(size_usd, is_maker);

        self.positions[idx].merge(price, size_usd, fee);

        let fill = Fill {
            id: self.ids.next_fill_id(),
            timestamp: bar.timestamp,
            symbol: bar.symbol.clone(),
            side,
            price,
            size_usd,
            fee,
            is_entry: true,
            reason: None,
        };
        self.fills.push(fill.clone());
        self.total_fees += fee;
        self.cash -= fee;
        Some(fill)
    }

    /// Close `close_pct` of the position at `index`. `close_pct = 1.0`
    /// removes the position; a fraction reduces its size and, for
    /// `PARTIAL_TP`, installs the follow-up take-profit and marks
    /// `partial_tp.done` so the slice cannot fire twice.
    pub fn close_position(
        &mut self,
        exec: &ExecutionModel,
        index: usize,
        raw_exit_price: f64,
        bar: &Bar,
        reason: ExitReason,
        close_pct: f64,
        is_maker: bool,
    ) -> TradeRecord {
        let pos = &mut self.positions[index];
        let exit_price = exec.apply_exit_slippage(raw_exit_price, pos.side);
        let slice_size = pos.size_usd * close_pct;
        let slice_entry_fee = pos.entry_fee * close_pct;
        let exit_fee = exec.calc_fee(slice_size, is_maker);
        let pnl_pct = pos.unrealized_pnl_pct(exit_price);
        let pnl_usd_gross = slice_size * pnl_pct;
        let fees = slice_entry_fee + exit_fee;
        // TradeRecord.pnl_usd is net of fees; cash settles off the gross
        // figure below since entry_fee was already deducted at open.
        let pnl_usd = pnl_usd_gross - fees;
        let is_partial = close_pct < 1.0;

        let trade = TradeRecord {
            id: self.ids.next_trade_id(),
            symbol: pos.symbol.clone(),
            side: pos.side,
            entry_time: pos.entry_time,
            entry_price: pos.entry_price,
            exit_time: bar.timestamp,
            exit_price,
            size_usd: slice_size,
            pnl_usd,
            pnl_pct,
            fees,
            reason,
            is_partial,
            group: pos.group.clone(),
        };

        let fill = Fill {
            id: self.ids.next_fill_id(),
            timestamp: bar.timestamp,
            symbol: pos.symbol.clone(),
            side: pos.side,
            price: exit_price,
            size_usd: slice_size,
            fee: exit_fee,
            is_entry: false,
            reason: Some(reason),
        };

        if is_partial {
            pos.size_usd -= slice_size;
            pos.entry_fee -= slice_entry_fee;
            if reason == ExitReason::PartialTp {
                pos.partial_tp.done = true;
                pos.take_profit =
                    derive_take_profit(pos.side, pos.entry_price, Some(pos.partial_tp.new_tp_pct));
            }
        } else {
            self.positions.remove(index);
        }

        self.cash += pnl_usd_gross - exit_fee;
        self.total_fees += exit_fee;
        self.fills.push(fill);
        self.trades.push(trade.clone());
        self.record_equity(bar.timestamp);

        trade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::FixedSizer;
    use chrono::TimeZone;

    fn bar(symbol: &str, t: DateTime<Utc>, open: f64) -> Bar {
        Bar::new(t, symbol, "1m", open, open + 1.0, open - 1.0, open, 1000.0)
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap()
    }

    #[test]
    fn open_position_charges_fee_and_records_fill() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(10_000.0);
        let b = bar("SPY", ts(9, 30), 100.0);
        let params = OrderParams::default();

        let fill = pf.open_position(&exec, &sizer, &b, Side::Long, &params, 100.0, true, false);
        assert!(fill.is_entry);
        assert_eq!(pf.positions.len(), 1);
        assert_eq!(pf.fills.len(), 1);
        assert!(pf.cash < 100_000.0); // fee charged
        assert!(pf.positions[0].entry_price > 100.0); // adverse slippage
    }

    #[test]
    fn can_open_respects_max_positions_per_group() {
        let mut pf = Portfolio::new(100_000.0, 1, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(1_000.0);
        let b = bar("SPY", ts(9, 30), 100.0);
        let params = OrderParams::default();
        assert!(pf.can_open(&None));
        pf.open_position(&exec, &sizer, &b, Side::Long, &params, 100.0, true, false);
        assert!(!pf.can_open(&None));
    }

    #[test]
    fn direction_conflict_blocks_opposite_side_in_same_group() {
        let mut pf = Portfolio::new(100_000.0, 5, true);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(1_000.0);
        let b = bar("SPY", ts(9, 30), 100.0);
        let mut params = OrderParams::default();
        params.group = Some("trend".into());
        pf.open_position(&exec, &sizer, &b, Side::Long, &params, 100.0, true, false);
        assert!(pf.direction_conflict(&Some("trend".into()), Side::Short));
        assert!(!pf.direction_conflict(&Some("trend".into()), Side::Long));
        assert!(!pf.direction_conflict(&Some("other".into()), Side::Short));
    }

    #[test]
    fn merge_into_position_requires_existing_target() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(1_000.0);
        let b = bar("SPY", ts(9, 31), 101.0);
        let params = OrderParams::default();
        let result =
            pf.merge_into_position(&exec, &sizer, &b, Side::Long, &None, &params, 101.0, false, false);
        assert!(result.is_none());
    }

    #[test]
    fn merge_into_position_extends_most_recent_in_group() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(1_000.0);
        let b1 = bar("SPY", ts(9, 30), 100.0);
        let params = OrderParams::default();
        pf.open_position(&exec, &sizer, &b1, Side::Long, &params, 100.0, false, false);

        let b2 = bar("SPY", ts(9, 31), 95.0);
        let fill = pf
            .merge_into_position(&exec, &sizer, &b2, Side::Long, &None, &params, 95.0, false, false)
            .unwrap();
        assert!(fill.is_entry);
        assert_eq!(pf.positions.len(), 1);
        assert_eq!(pf.positions[0].size_usd, 2_000.0);
    }

    #[test]
    fn close_position_full_removes_and_records_trade() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(10_000.0);
        let b1 = bar("SPY", ts(9, 30), 100.0);
        let params = OrderParams::default();
        pf.open_position(&exec, &sizer, &b1, Side::Long, &params, 100.0, false, false);

        let b2 = bar("SPY", ts(9, 40), 110.0);
        let trade = pf.close_position(&exec, 0, 110.0, &b2, ExitReason::TakeProfit, 1.0, false);
        assert!(pf.positions.is_empty());
        assert_eq!(pf.trades.len(), 1);
        assert!(trade.pnl_usd > 0.0);
        assert!(!trade.is_partial);
    }

    #[test]
    fn close_position_partial_keeps_remainder_open_with_new_tp() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(10_000.0);
        let b1 = bar("SPY", ts(9, 30), 100.0);
        let mut params = OrderParams::default();
        params.partial_tp_pct = Some(0.5);
        params.partial_tp_new_tp_pct = Some(0.1);
        pf.open_position(&exec, &sizer, &b1, Side::Long, &params, 100.0, false, false);
        let entry_price = pf.positions[0].entry_price;

        let b2 = bar("SPY", ts(9, 40), 105.0);
        let trade = pf.close_position(&exec, 0, 105.0, &b2, ExitReason::PartialTp, 0.5, false);
        assert!(trade.is_partial);
        assert_eq!(pf.positions.len(), 1);
        assert_eq!(pf.positions[0].size_usd, 5_000.0);
        assert!(pf.positions[0].partial_tp.done);
        assert!((pf.positions[0].take_profit - entry_price * 1.1).abs() < 1e-6);
    }

    #[test]
    fn equity_tracks_unrealized_pnl_via_last_price() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        let exec = ExecutionModel::default();
        let sizer = FixedSizer::new(10_000.0);
        let b1 = bar("SPY", ts(9, 30), 100.0);
        let params = OrderParams::default();
        pf.open_position(&exec, &sizer, &b1, Side::Long, &params, 100.0, false, false);
        pf.update_price("SPY", 110.0);
        assert!(pf.equity() > pf.cash);
    }

    #[test]
    fn record_equity_tracks_peak_and_drawdown() {
        let mut pf = Portfolio::new(100_000.0, 5, false);
        pf.update_price("SPY", 100.0);
        pf.record_equity(ts(9, 30));
        pf.cash = 90_000.0;
        pf.record_equity(ts(9, 31));
        assert_eq!(pf.peak_equity, 100_000.0);
        assert!((pf.max_drawdown_pct - 0.10).abs() < 1e-9);
    }
}
