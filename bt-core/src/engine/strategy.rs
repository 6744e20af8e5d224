//! Strategy — user-supplied callbacks driven by the bar processor.
//!
//! Every callback returns a `Result` rather than raising: an `Err` from any
//! of them propagates out of `process_bar` and aborts the run rather than
//! being swallowed (SPEC_FULL.md §7). Default implementations let a
//! strategy that only cares about entries skip the exit-management hooks.

use crate::domain::trade::ExitReason;
use crate::domain::{Bar, Fill, Order, Position, TradeRecord};
use crate::engine::config::EngineConfig;
use crate::error::EngineError;
use std::collections::HashMap;

pub trait Strategy {
    /// Called once before the first bar. Receives the engine's resolved
    /// configuration so the strategy can validate its own parameters
    /// against it (e.g. checking an indicator it depends on was declared).
    fn configure(&mut self, _config: &EngineConfig) -> Result<(), EngineError> {
        Ok(())
    }

    /// Phase 4. Zero or more orders, queued for later bars.
    fn on_bar(
        &mut self,
        bar: &Bar,
        indicators: &HashMap<String, f64>,
        positions: &[Position],
    ) -> Result<Vec<Order>, EngineError>;

    /// Invoked after every entry or merge fill. May return a follow-up
    /// order (e.g. arm a stop-loss as a separate StopOrder).
    fn on_fill(&mut self, _fill: &Fill) -> Result<Option<Order>, EngineError> {
        Ok(None)
    }

    /// Invoked after every exit, full or partial.
    fn on_exit(
        &mut self,
        _fill: &Fill,
        _trade: &TradeRecord,
    ) -> Result<Option<Order>, EngineError> {
        Ok(None)
    }

    /// Phase 3.5. Strategy-initiated exits independent of the execution
    /// model's SL/TP checks. Each tuple is `(position_index, exit_price,
    /// reason, close_pct)`; `close_pct = None` means a full close.
    fn check_exits(
        &mut self,
        _bar: &Bar,
        _positions: &[Position],
    ) -> Result<Vec<(usize, f64, ExitReason, Option<f64>)>, EngineError> {
        Ok(Vec::new())
    }

    /// Advisory: timeframe -> bar count a strategy wants buffered before
    /// its signals should be trusted. The processor does not enforce this.
    fn warmup_periods(&self) -> HashMap<String, usize> {
        HashMap::new()
    }
}
