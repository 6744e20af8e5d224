//! Exponential Moving Average — seeded with an SMA of the first `period`
//! closes, then recurses `ema = alpha*close + (1-alpha)*prev`.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }
}

impl Indicator for Ema {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        if let Some(prev) = self.value {
            let next = self.alpha * bar.close + (1.0 - self.alpha) * prev;
            self.value = Some(next);
            return Some(next);
        }
        self.seed_sum += bar.close;
        self.seed_count += 1;
        if self.seed_count == self.period {
            let seed = self.seed_sum / self.period as f64;
            self.value = Some(seed);
            return Some(seed);
        }
        None
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    fn reset(&mut self) {
        self.seed_sum = 0.0;
        self.seed_count = 0;
        self.value = None;
    }
}
