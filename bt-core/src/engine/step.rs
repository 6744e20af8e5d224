//! Step Runner — an RL-style `reset`/`step` interface over the same
//! bar processor the backtest runner uses. The wrapped strategy still
//! drives entry/exit management via its normal callbacks; only the
//! signal decision (`on_bar`'s returned orders) is replaced by an
//! externally-supplied action (SPEC_FULL.md §4.5).

use crate::domain::trade::ExitReason;
use crate::domain::{Bar, Fill, Order, Position, TradeRecord};
use crate::engine::config::EngineConfig;
use crate::engine::processor::BarProcessor;
use crate::engine::strategy::Strategy;
use crate::error::EngineError;
use crate::sizing::PositionSizer;
use std::collections::HashMap;

/// Wraps a `Strategy` so Phase 4's `on_bar` never emits an order itself —
/// the step runner enqueues the agent's action directly instead, via
/// `BarProcessor::enqueue_order`. Every other callback still delegates to
/// the inner strategy, so exit management keeps working as configured.
struct ProxyStrategy<T: Strategy> {
    inner: T,
}

impl<T: Strategy> Strategy for ProxyStrategy<T> {
    fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.inner.configure(config)
    }

    fn on_bar(
        &mut self,
        _bar: &Bar,
        _indicators: &HashMap<String, f64>,
        _positions: &[Position],
    ) -> Result<Vec<Order>, EngineError> {
        Ok(Vec::new())
    }

    fn on_fill(&mut self, fill: &Fill) -> Result<Option<Order>, EngineError> {
        self.inner.on_fill(fill)
    }

    fn on_exit(&mut self, fill: &Fill, trade: &TradeRecord) -> Result<Option<Order>, EngineError> {
        self.inner.on_exit(fill, trade)
    }

    fn check_exits(
        &mut self,
        bar: &Bar,
        positions: &[Position],
    ) -> Result<Vec<(usize, f64, ExitReason, Option<f64>)>, EngineError> {
        self.inner.check_exits(bar, positions)
    }

    fn warmup_periods(&self) -> HashMap<String, usize> {
        self.inner.warmup_periods()
    }
}

/// What an agent sees after each step: the raw bar, the indicator
/// snapshot, and the open positions, mirroring the arguments a normal
/// `on_bar` call would have received.
#[derive(Debug, Clone)]
pub struct StepObservation {
    pub bar: Bar,
    pub indicators: HashMap<String, f64>,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Option<StepObservation>,
    /// `equity[N] - equity[N-1]`.
    pub reward: f64,
    pub done: bool,
}

/// Bar-at-a-time control for reinforcement-learning-style consumers.
/// Owns its own bar cursor over a fixed, pre-loaded series.
pub struct StepRunner<T: Strategy> {
    config: EngineConfig,
    processor: BarProcessor,
    strategy: ProxyStrategy<T>,
    bars: Vec<Bar>,
    cursor: usize,
    done: bool,
    last_equity: f64,
}

impl<T: Strategy> StepRunner<T> {
    pub fn new(
        config: &EngineConfig,
        sizer: Box<dyn PositionSizer>,
        strategy: T,
        bars: Vec<Bar>,
    ) -> Self {
        let done = bars.is_empty();
        Self {
            config: config.clone(),
            processor: BarProcessor::new(config, sizer),
            strategy: ProxyStrategy { inner: strategy },
            bars,
            cursor: 0,
            done,
            last_equity: config.initial_capital,
        }
    }

    /// Rewind to bar zero with a freshly-reset processor and reward baseline.
    /// Returns the first observation, or `None` if the series is empty.
    pub fn reset(&mut self) -> Result<Option<StepObservation>, EngineError> {
        self.processor.reset();
        self.strategy.inner.configure(&self.config)?;
        self.cursor = 0;
        self.done = self.bars.is_empty();
        self.last_equity = self.processor.portfolio.equity();
        Ok(self.peek_observation())
    }

    /// Process the current bar, then enqueue `action` exactly as if the
    /// strategy's `on_bar` had returned it — it fills on a later bar's
    /// open, same as a normal signal, never on the bar just processed.
    pub fn step(&mut self, action: Option<Order>) -> Result<StepResult, EngineError> {
        if self.done {
            return Err(EngineError::StepExhausted);
        }

        let bar = self.bars[self.cursor].clone();
        self.processor.process_bar(&mut self.strategy, &bar)?;
        if let Some(order) = action {
            self.processor.enqueue_order(order)?;
        }
        self.cursor += 1;

        let equity = self.processor.portfolio.equity();
        let reward = equity - self.last_equity;
        self.last_equity = equity;

        self.done = self.cursor >= self.bars.len();
        let observation = if self.done { None } else { self.peek_observation() };

        Ok(StepResult { observation, reward, done: self.done })
    }

    fn peek_observation(&self) -> Option<StepObservation> {
        self.bars.get(self.cursor).map(|bar| StepObservation {
            bar: bar.clone(),
            indicators: self.processor.indicators.snapshot(),
            positions: self.processor.portfolio.positions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{MarketOrder, OrderParams};
    use crate::domain::bar::Side;
    use crate::execution::ExecutionModel;
    use crate::sizing::FixedSizer;
    use chrono::{TimeZone, Utc};

    struct PassiveStrategy;
    impl Strategy for PassiveStrategy {
        fn on_bar(
            &mut self,
            _bar: &Bar,
            _indicators: &HashMap<String, f64>,
            _positions: &[Position],
        ) -> Result<Vec<Order>, EngineError> {
            Ok(Vec::new())
        }
    }

    fn bars(n: i64) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        (0..n)
            .map(|i| {
                Bar::new(
                    t0 + chrono::Duration::minutes(i),
                    "SPY",
                    "1m",
                    100.0,
                    101.0,
                    99.0,
                    100.0,
                    1000.0,
                )
            })
            .collect()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            execution: ExecutionModel {
                slippage: 0.0,
                taker_fee: 0.0,
                maker_fee: 0.0,
            },
            max_positions: 5,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn external_action_is_enqueued_and_fills_next_bar() {
        let mut runner = StepRunner::new(&config(), Box::new(FixedSizer::new(1_000.0)), PassiveStrategy, bars(3));
        runner.reset().unwrap();

        let action = Order::Market(MarketOrder { side: Side::Long, params: OrderParams::default() });
        let result = runner.step(Some(action)).unwrap();
        assert!(!result.done);
        assert!(runner.processor.portfolio.positions.is_empty(), "T+1: no same-bar fill");

        runner.step(None).unwrap();
        assert_eq!(runner.processor.portfolio.positions.len(), 1);
    }

    #[test]
    fn step_after_done_returns_exhausted_error() {
        let mut runner = StepRunner::new(&config(), Box::new(FixedSizer::new(1_000.0)), PassiveStrategy, bars(1));
        runner.reset().unwrap();
        let result = runner.step(None).unwrap();
        assert!(result.done);
        assert!(matches!(runner.step(None), Err(EngineError::StepExhausted)));
    }

    #[test]
    fn reward_tracks_equity_delta() {
        let mut runner = StepRunner::new(&config(), Box::new(FixedSizer::new(1_000.0)), PassiveStrategy, bars(2));
        runner.reset().unwrap();
        let result = runner.step(None).unwrap();
        assert_eq!(result.reward, 0.0, "flat bars produce no equity change");
    }
}
