//! Streaming indicators.
//!
//! Each indicator consumes one bar at a time via `update`, rather than
//! precomputing over a full bar slice: the processor calls Phase 4 once per
//! bar, so indicators must carry their own rolling state between calls
//! instead of seeing the whole series up front (SPEC_FULL.md §4.8).
//!
//! Multi-series indicators (Donchian, Bollinger, Keltner, Aroon) are exposed
//! as separate named instances per band, keeping the single-series
//! `Indicator` trait unchanged — the same convention the batch version of
//! this crate used, just re-grounded on a streaming update.

pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod donchian;
pub mod ema;
pub mod keltner;
pub mod parabolic_sar;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use adx::Adx;
pub use aroon::{Aroon, AroonLine};
pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use donchian::{Donchian, DonchianBand};
pub use ema::Ema;
pub use keltner::{Keltner, KeltnerBand};
pub use parabolic_sar::ParabolicSar;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single-series streaming indicator.
pub trait Indicator: std::fmt::Debug {
    /// Consume one bar, returning the new value once the indicator has
    /// accumulated enough history, `None` during warmup.
    fn update(&mut self, bar: &Bar) -> Option<f64>;
    fn is_ready(&self) -> bool;
    fn reset(&mut self);
}

/// Declares one indicator an engine run should maintain. Built from
/// configuration rather than a global type registry — SPEC_FULL.md §9
/// models the strategy's "process-wide registry" as factories passed by
/// value, not a static map keyed by type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum IndicatorSpec {
    Sma { period: usize },
    Ema { period: usize },
    Rsi { period: usize },
    Atr { period: usize },
    Donchian { period: usize, band: DonchianBand },
    Bollinger { period: usize, num_std: f64, band: BollingerBand },
    Keltner { period: usize, atr_mult: f64, band: KeltnerBand },
    Adx { period: usize },
    Aroon { period: usize, line: AroonLine },
    Roc { period: usize },
    ParabolicSar { af_start: f64, af_step: f64, af_max: f64 },
}

impl IndicatorSpec {
    pub fn build(self) -> Box<dyn Indicator> {
        match self {
            IndicatorSpec::Sma { period } => Box::new(Sma::new(period)),
            IndicatorSpec::Ema { period } => Box::new(Ema::new(period)),
            IndicatorSpec::Rsi { period } => Box::new(Rsi::new(period)),
            IndicatorSpec::Atr { period } => Box::new(Atr::new(period)),
            IndicatorSpec::Donchian { period, band } => Box::new(Donchian::new(period, band)),
            IndicatorSpec::Bollinger { period, num_std, band } => {
                Box::new(Bollinger::new(period, num_std, band))
            }
            IndicatorSpec::Keltner { period, atr_mult, band } => {
                Box::new(Keltner::new(period, atr_mult, band))
            }
            IndicatorSpec::Adx { period } => Box::new(Adx::new(period)),
            IndicatorSpec::Aroon { period, line } => Box::new(Aroon::new(period, line)),
            IndicatorSpec::Roc { period } => Box::new(Roc::new(period)),
            IndicatorSpec::ParabolicSar { af_start, af_step, af_max } => {
                Box::new(ParabolicSar::new(af_start, af_step, af_max))
            }
        }
    }
}

/// Owns one boxed indicator per declared name, fed a bar at a time.
#[derive(Debug, Default)]
pub struct IndicatorManager {
    indicators: HashMap<String, Box<dyn Indicator>>,
    latest: HashMap<String, f64>,
}

impl IndicatorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, spec: IndicatorSpec) {
        self.indicators.insert(name.into(), spec.build());
    }

    /// Feed the bar to every registered indicator, updating the latest-value
    /// cache for whichever ones produced a value this bar.
    pub fn update(&mut self, bar: &Bar) {
        for (name, indicator) in self.indicators.iter_mut() {
            if let Some(v) = indicator.update(bar) {
                self.latest.insert(name.clone(), v);
            }
        }
    }

    /// The most recent value seen for every indicator that has become ready
    /// at least once. Handed to `Strategy::on_bar` as the indicator snapshot.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.latest.clone()
    }

    pub fn get(&self, name: &str) -> Result<&Box<dyn Indicator>, EngineError> {
        self.indicators
            .get(name)
            .ok_or_else(|| EngineError::UnknownIndicatorType(name.to_string()))
    }

    pub fn all_ready(&self) -> bool {
        self.indicators.values().all(|i| i.is_ready())
    }

    pub fn reset(&mut self) {
        for indicator in self.indicators.values_mut() {
            indicator.reset();
        }
        self.latest.clear();
    }
}

/// Synthetic bars from a close-price series, for indicator unit tests.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{TimeZone, Utc};
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i as i64),
                "TEST",
                "1d",
                open,
                high,
                low,
                close,
                1000.0,
            )
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;
