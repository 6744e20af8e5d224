//! Rate of Change — percentage price change over `period` bars.
//! `ROC = (close - close[period bars ago]) / close[period bars ago] * 100`.

use super::Indicator;
use crate::domain::Bar;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    window: VecDeque<f64>,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
        }
    }
}

impl Indicator for Roc {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.window.push_back(bar.close);
        if self.window.len() > self.period + 1 {
            self.window.pop_front();
        }
        if self.window.len() < self.period + 1 {
            return None;
        }
        let prev = self.window.front().copied().unwrap();
        let curr = bar.close;
        Some((curr - prev) / prev * 100.0)
    }

    fn is_ready(&self) -> bool {
        self.window.len() >= self.period + 1
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}
