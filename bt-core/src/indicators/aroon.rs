//! Aroon — bars since the highest high / lowest low, as a percentage of
//! the lookback window. `100 * (period - bars_since_extreme) / period`.

use serde::{Deserialize, Serialize};
use super::Indicator;
use crate::domain::Bar;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AroonLine {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Aroon {
    period: usize,
    line: AroonLine,
    /// (high, low) per bar, most recent at the back.
    window: VecDeque<(f64, f64)>,
}

impl Aroon {
    pub fn new(period: usize, line: AroonLine) -> Self {
        assert!(period >= 1, "Aroon period must be >= 1");
        Self {
            period,
            line,
            window: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn up(period: usize) -> Self {
        Self::new(period, AroonLine::Up)
    }

    pub fn down(period: usize) -> Self {
        Self::new(period, AroonLine::Down)
    }
}

impl Indicator for Aroon {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.window.push_back((bar.high, bar.low));
        if self.window.len() > self.period + 1 {
            self.window.pop_front();
        }
        if self.window.len() < self.period + 1 {
            return None;
        }

        let bars_since = match self.line {
            AroonLine::Up => {
                let (idx, _) = self
                    .window
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1 .0.partial_cmp(&b.1 .0).unwrap())
                    .unwrap();
                self.window.len() - 1 - idx
            }
            AroonLine::Down => {
                let (idx, _) = self
                    .window
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1 .1.partial_cmp(&b.1 .1).unwrap())
                    .unwrap();
                self.window.len() - 1 - idx
            }
        };
        Some(100.0 * (self.period - bars_since) as f64 / self.period as f64)
    }

    fn is_ready(&self) -> bool {
        self.window.len() >= self.period + 1
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}
