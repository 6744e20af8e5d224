//! Average True Range — Wilder-smoothed true range.
//! `TR = max(high-low, |high-prev_close|, |low-prev_close|)`. The very first
//! bar has no previous close, so it contributes no TR sample.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    fn true_range(&self, bar: &Bar, prev_close: f64) -> f64 {
        (bar.high - bar.low)
            .max((bar.high - prev_close).abs())
            .max((bar.low - prev_close).abs())
    }
}

impl Indicator for Atr {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev_close = match self.prev_close.replace(bar.close) {
            Some(p) => p,
            None => return None,
        };
        let tr = self.true_range(bar, prev_close);

        if let Some(prev) = self.value {
            let alpha = 1.0 / self.period as f64;
            let next = alpha * tr + (1.0 - alpha) * prev;
            self.value = Some(next);
            return Some(next);
        }

        self.seed_sum += tr;
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
        *self = Atr::new(self.period);
    }
}
