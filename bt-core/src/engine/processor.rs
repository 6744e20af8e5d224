//! Bar Processor — the four-phase per-bar execution loop.
//!
//! Phase ordering is fixed: market fills, then limit fills, then stop
//! fills, then exits (including partial take-profit), then
//! strategy-initiated exits, then indicator update and signal dispatch
//! (SPEC_FULL.md §4.3, §5).

use crate::domain::ids::{IdGen, PendingToken};
use crate::domain::order::{LimitOrder, MarketOrder, Order, StopOrder};
use crate::domain::trade::ExitReason;
use crate::domain::{Bar, Portfolio};
use crate::engine::config::EngineConfig;
use crate::engine::strategy::Strategy;
use crate::error::EngineError;
use crate::execution::ExecutionModel;
use crate::indicators::IndicatorManager;
use crate::sizing::PositionSizer;

struct PendingLimit {
    token: PendingToken,
    order: LimitOrder,
    bars_elapsed: u32,
}

struct PendingStop {
    token: PendingToken,
    order: StopOrder,
    bars_elapsed: u32,
}

/// Owns one run's portfolio, indicator state, and pending-order queues.
/// One processor per symbol; the multi-asset runner holds several.
pub struct BarProcessor {
    pub portfolio: Portfolio,
    pub indicators: IndicatorManager,
    execution: ExecutionModel,
    sizer: Box<dyn PositionSizer>,
    skip_signal_on_close: bool,
    pending_market: Option<MarketOrder>,
    pending_limits: Vec<PendingLimit>,
    pending_stops: Vec<PendingStop>,
    tokens: IdGen,
    initial_capital: f64,
    base_max_positions: usize,
    same_direction_only: bool,
    /// Exposure-cap enforcement stashes the pre-clamp `max_positions` here
    /// for the duration of one `process_bar` call (multi-asset runner only).
    pub saved_max_positions: Option<usize>,
}

impl BarProcessor {
    pub fn new(config: &EngineConfig, sizer: Box<dyn PositionSizer>) -> Self {
        let mut indicators = IndicatorManager::new();
        for (name, spec) in &config.indicators {
            indicators.register(name.clone(), *spec);
        }
        Self {
            portfolio: Portfolio::new(
                config.initial_capital,
                config.max_positions,
                config.same_direction_only,
            ),
            indicators,
            execution: config.execution,
            sizer,
            skip_signal_on_close: config.skip_signal_on_close,
            pending_market: None,
            pending_limits: Vec::new(),
            pending_stops: Vec::new(),
            tokens: IdGen::default(),
            initial_capital: config.initial_capital,
            base_max_positions: config.max_positions,
            same_direction_only: config.same_direction_only,
            saved_max_positions: None,
        }
    }

    /// Rewind to a fresh run: empty portfolio, cold indicators, no pending
    /// orders. Used by the step/reset interface between episodes.
    pub fn reset(&mut self) {
        self.portfolio = Portfolio::new(
            self.initial_capital,
            self.base_max_positions,
            self.same_direction_only,
        );
        self.indicators.reset();
        self.pending_market = None;
        self.pending_limits.clear();
        self.pending_stops.clear();
        self.tokens.reset();
        self.saved_max_positions = None;
    }

    /// Enqueue an order exactly as if a strategy callback had returned it.
    /// Used directly by the step runner, whose proxy strategy never
    /// returns an order from `on_bar` itself.
    pub fn enqueue_order(&mut self, order: Order) -> Result<(), EngineError> {
        self.dispatch_follow_up(order)
    }

    pub fn process_bar(
        &mut self,
        strategy: &mut dyn Strategy,
        bar: &Bar,
    ) -> Result<(), EngineError> {
        let mut just_closed = false;

        self.phase1_market(strategy, bar)?;
        self.phase1b_limits(strategy, bar)?;
        self.phase1c_stops(strategy, bar)?;
        self.phase3_exits(strategy, bar, &mut just_closed)?;
        self.phase3_5_strategy_exits(strategy, bar, &mut just_closed)?;
        self.phase4_signals(strategy, bar, just_closed)?;

        self.portfolio.update_price(&bar.symbol, bar.close);
        Ok(())
    }

    fn phase1_market(&mut self, strategy: &mut dyn Strategy, bar: &Bar) -> Result<(), EngineError> {
        let Some(order) = self.pending_market.take() else {
            return Ok(());
        };
        let group = order.params.group.clone();
        if !self.portfolio.can_open(&group) || self.portfolio.direction_conflict(&group, order.side)
        {
            return Ok(());
        }
        let fill = self.portfolio.open_position(
            &self.execution,
            self.sizer.as_ref(),
            bar,
            order.side,
            &order.params,
            bar.open,
            true,
            false,
        );
        if let Some(follow_up) = strategy.on_fill(&fill)? {
            self.dispatch_follow_up(follow_up)?;
        }
        Ok(())
    }

    fn phase1b_limits(&mut self, strategy: &mut dyn Strategy, bar: &Bar) -> Result<(), EngineError> {
        let snapshot: Vec<PendingToken> = self.pending_limits.iter().map(|p| p.token).collect();
        let mut to_remove: Vec<PendingToken> = Vec::new();

        for token in snapshot {
            let Some(idx) = self.pending_limits.iter().position(|p| p.token == token) else {
                continue;
            };

            let merge_position = self.pending_limits[idx].order.merge_position;
            let group = self.pending_limits[idx].order.params.group.clone();
            let side = self.pending_limits[idx].order.side;

            if merge_position {
                if self.portfolio.positions_in_group(&group) == 0 {
                    self.pending_limits[idx].bars_elapsed += 1;
                    self.expire_if_timed_out_limit(idx, token, &mut to_remove);
                    continue;
                }
            } else if !self.portfolio.can_open(&group)
                || self.portfolio.direction_conflict(&group, side)
            {
                to_remove.push(token);
                continue;
            }

            self.pending_limits[idx].bars_elapsed += 1;

            let below_min_positions = self.pending_limits[idx]
                .order
                .min_positions
                .is_some_and(|min| self.portfolio.positions.len() < min);

            if !below_min_positions {
                let limit_price = self.pending_limits[idx].order.limit_price;
                if self.execution.check_limit_fill(limit_price, side, bar) {
                    let raw_price = self.execution.limit_fill_price(limit_price, side, bar);
                    let use_maker_fee = self.pending_limits[idx].order.use_maker_fee;
                    let params = self.pending_limits[idx].order.params.clone();

                    let fill = if merge_position {
                        self.portfolio.merge_into_position(
                            &self.execution,
                            self.sizer.as_ref(),
                            bar,
                            side,
                            &group,
                            &params,
                            raw_price,
                            false,
                            use_maker_fee,
                        )
                    } else {
                        Some(self.portfolio.open_position(
                            &self.execution,
                            self.sizer.as_ref(),
                            bar,
                            side,
                            &params,
                            raw_price,
                            false,
                            use_maker_fee,
                        ))
                    };

                    if let Some(fill) = fill {
                        to_remove.push(token);
                        if let Some(follow_up) = strategy.on_fill(&fill)? {
                            self.dispatch_follow_up(follow_up)?;
                        }
                        continue;
                    }
                }
            }

            self.expire_if_timed_out_limit(idx, token, &mut to_remove);
        }

        self.pending_limits.retain(|p| !to_remove.contains(&p.token));
        Ok(())
    }

    fn expire_if_timed_out_limit(
        &self,
        idx: usize,
        token: PendingToken,
        to_remove: &mut Vec<PendingToken>,
    ) {
        let order = &self.pending_limits[idx].order;
        if order.timeout_bars > 0 && self.pending_limits[idx].bars_elapsed >= order.timeout_bars {
            to_remove.push(token);
        }
    }

    fn phase1c_stops(&mut self, strategy: &mut dyn Strategy, bar: &Bar) -> Result<(), EngineError> {
        let snapshot: Vec<PendingToken> = self.pending_stops.iter().map(|p| p.token).collect();
        let mut to_remove: Vec<PendingToken> = Vec::new();

        for token in snapshot {
            let Some(idx) = self.pending_stops.iter().position(|p| p.token == token) else {
                continue;
            };

            let group = self.pending_stops[idx].order.params.group.clone();
            let side = self.pending_stops[idx].order.side;

            if !self.portfolio.can_open(&group) || self.portfolio.direction_conflict(&group, side) {
                to_remove.push(token);
                continue;
            }

            self.pending_stops[idx].bars_elapsed += 1;

            let stop_price = self.pending_stops[idx].order.stop_price;
            if self.execution.check_stop_trigger(stop_price, side, bar) {
                let raw_price = self.execution.stop_trigger_price(stop_price, side, bar);
                let params = self.pending_stops[idx].order.params.clone();
                let fill = self.portfolio.open_position(
                    &self.execution,
                    self.sizer.as_ref(),
                    bar,
                    side,
                    &params,
                    raw_price,
                    true,
                    false,
                );
                to_remove.push(token);
                if let Some(follow_up) = strategy.on_fill(&fill)? {
                    self.dispatch_follow_up(follow_up)?;
                }
                continue;
            }

            let order = &self.pending_stops[idx].order;
            if order.timeout_bars > 0 && self.pending_stops[idx].bars_elapsed >= order.timeout_bars
            {
                to_remove.push(token);
            }
        }

        self.pending_stops.retain(|p| !to_remove.contains(&p.token));
        Ok(())
    }

    fn phase3_exits(
        &mut self,
        strategy: &mut dyn Strategy,
        bar: &Bar,
        just_closed: &mut bool,
    ) -> Result<(), EngineError> {
        let mut exits: Vec<(usize, f64, ExitReason)> = Vec::new();
        for (idx, pos) in self.portfolio.positions.iter_mut().enumerate() {
            if let Some((price, reason)) = self.execution.check_exit(pos, bar) {
                exits.push((idx, price, reason));
            }
        }
        exits.sort_by(|a, b| b.0.cmp(&a.0));

        for (idx, price, reason) in exits {
            let is_take_profit = reason.base() == ExitReason::TakeProfit;
            let partial_tp = self.portfolio.positions[idx].partial_tp.clone();

            let (close_pct, actual_reason) = if is_take_profit && partial_tp.fraction > 0.0 && !partial_tp.done
            {
                (partial_tp.fraction, ExitReason::PartialTp)
            } else {
                (1.0, reason)
            };

            let trade = self
                .portfolio
                .close_position(&self.execution, idx, price, bar, actual_reason, close_pct, false);
            let fill = self.portfolio.fills.last().expect("close_position appends a fill").clone();

            if close_pct >= 1.0 {
                *just_closed = true;
            }
            if let Some(follow_up) = strategy.on_exit(&fill, &trade)? {
                self.dispatch_follow_up(follow_up)?;
            }
        }
        Ok(())
    }

    fn phase3_5_strategy_exits(
        &mut self,
        strategy: &mut dyn Strategy,
        bar: &Bar,
        just_closed: &mut bool,
    ) -> Result<(), EngineError> {
        let snapshot = self.portfolio.positions.clone();
        let mut exits = strategy.check_exits(bar, &snapshot)?;
        exits.sort_by(|a, b| b.0.cmp(&a.0));

        for (idx, price, reason, close_pct) in exits {
            if idx >= self.portfolio.positions.len() {
                continue;
            }
            let pct = close_pct.unwrap_or(1.0);
            let trade = self
                .portfolio
                .close_position(&self.execution, idx, price, bar, reason, pct, false);
            let fill = self.portfolio.fills.last().expect("close_position appends a fill").clone();

            if pct >= 1.0 {
                *just_closed = true;
            }
            if let Some(follow_up) = strategy.on_exit(&fill, &trade)? {
                self.dispatch_follow_up(follow_up)?;
            }
        }
        Ok(())
    }

    fn phase4_signals(
        &mut self,
        strategy: &mut dyn Strategy,
        bar: &Bar,
        just_closed: bool,
    ) -> Result<(), EngineError> {
        self.indicators.update(bar);

        if self.skip_signal_on_close && just_closed {
            return Ok(());
        }

        let snapshot_indicators = self.indicators.snapshot();
        let snapshot_positions = self.portfolio.positions.clone();
        let orders = strategy.on_bar(bar, &snapshot_indicators, &snapshot_positions)?;
        for order in orders {
            self.dispatch_follow_up(order)?;
        }
        Ok(())
    }

    /// `CancelPendingLimits` clears both queues immediately. Any other
    /// variant's `cancel_pending_limits` flag, when set, does the same
    /// before the order itself is enqueued. Otherwise: Stop -> stops
    /// queue, Limit -> limits queue, Market -> pending market order,
    /// replacing any market order already pending this bar. An order whose
    /// parameters fail validation is rejected before it reaches any queue.
    fn dispatch_follow_up(&mut self, order: Order) -> Result<(), EngineError> {
        if matches!(order, Order::CancelPendingLimits) {
            self.pending_limits.clear();
            self.pending_stops.clear();
            return Ok(());
        }

        if let Some(params) = order.params() {
            params.validate()?;
        }

        if order.cancel_pending_limits_flag() {
            self.pending_limits.clear();
            self.pending_stops.clear();
        }

        match order {
            Order::Market(m) => self.pending_market = Some(m),
            Order::Limit(l) => {
                let token = self.tokens.next_token();
                self.pending_limits.push(PendingLimit {
                    token,
                    order: l,
                    bars_elapsed: 0,
                });
            }
            Order::Stop(s) => {
                let token = self.tokens.next_token();
                self.pending_stops.push(PendingStop {
                    token,
                    order: s,
                    bars_elapsed: 0,
                });
            }
            Order::CancelPendingLimits => unreachable!("handled above"),
        }
        Ok(())
    }
}
