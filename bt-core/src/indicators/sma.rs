//! Simple Moving Average — rolling mean of close prices over `period` bars.

use super::Indicator;
use crate::domain::Bar;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }
}

impl Indicator for Sma {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.window.push_back(bar.close);
        self.sum += bar.close;
        if self.window.len() > self.period {
            self.sum -= self.window.pop_front().unwrap();
        }
        self.is_ready().then(|| self.sum / self.period as f64)
    }

    fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let mut sma = Sma::new(5);
        let values: Vec<Option<f64>> = bars.iter().map(|b| sma.update(b)).collect();
        for v in &values[..4] {
            assert!(v.is_none());
        }
        assert_approx(values[4].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(values[5].unwrap(), 13.0, DEFAULT_EPSILON);
        assert_approx(values[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let mut sma = Sma::new(1);
        assert_approx(sma.update(&bars[0]).unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(sma.update(&bars[1]).unwrap(), 200.0, DEFAULT_EPSILON);
        assert_approx(sma.update(&bars[2]).unwrap(), 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn reset_clears_window() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let mut sma = Sma::new(3);
        for b in &bars {
            sma.update(b);
        }
        assert!(sma.is_ready());
        sma.reset();
        assert!(!sma.is_ready());
    }
}
