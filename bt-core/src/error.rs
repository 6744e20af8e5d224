//! Engine error types.
//!
//! Configuration errors are fatal to a run and are reported at configure
//! time; execution edge cases (zero-volume bars, non-fillable limits,
//! single-bar SL/TP straddles) are normal inputs and are never represented
//! here (SPEC_FULL.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown indicator type: {0}")]
    UnknownIndicatorType(String),

    #[error("unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),

    #[error("invalid bar for {symbol}: {reason}")]
    InvalidBar { symbol: String, reason: String },

    #[error("invalid sizer configuration: {0}")]
    InvalidSizerConfig(String),

    #[error("strategy callback failed: {0}")]
    StrategyError(String),

    #[error("invalid order parameters: {0}")]
    InvalidOrderParams(String),

    #[error("step called after the bar stream was exhausted")]
    StepExhausted,
}
