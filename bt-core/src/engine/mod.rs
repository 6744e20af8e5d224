//! Engine: configuration, the strategy contract, and the bar-by-bar
//! execution loop, plus the runners built on top of it.

pub mod config;
pub mod multi;
pub mod processor;
pub mod runner;
pub mod step;
pub mod strategy;

pub use config::{EngineConfig, IndicatorDeclaration};
pub use multi::MultiAssetRunner;
pub use processor::BarProcessor;
pub use runner::{BacktestRunner, BarSource};
pub use step::{StepObservation, StepResult, StepRunner};
pub use strategy::Strategy;
