//! Bollinger Bands — SMA of close, plus/minus a population-stddev multiplier.
//! Middle/upper/lower are separate indicator instances over the same window.

use serde::{Deserialize, Serialize};
use super::Indicator;
use crate::domain::Bar;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    num_std: f64,
    band: BollingerBand,
    window: VecDeque<f64>,
}

impl Bollinger {
    pub fn new(period: usize, num_std: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            num_std,
            band,
            window: VecDeque::with_capacity(period),
        }
    }

    fn stats(&self) -> (f64, f64) {
        let n = self.period as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let variance = self.window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }
}

impl Indicator for Bollinger {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.window.push_back(bar.close);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }
        let (mean, std) = self.stats();
        Some(match self.band {
            BollingerBand::Middle => mean,
            BollingerBand::Upper => mean + self.num_std * std,
            BollingerBand::Lower => mean - self.num_std * std,
        })
    }

    fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn middle_band_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let mut mid = Bollinger::new(3, 2.0, BollingerBand::Middle);
        let values: Vec<Option<f64>> = bars.iter().map(|b| mid.update(b)).collect();
        assert_approx(values[2].unwrap(), 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn upper_is_above_middle_and_lower_below() {
        let bars = make_bars(&[10.0, 15.0, 8.0, 20.0, 5.0]);
        let mut upper = Bollinger::new(4, 2.0, BollingerBand::Upper);
        let mut mid = Bollinger::new(4, 2.0, BollingerBand::Middle);
        let mut lower = Bollinger::new(4, 2.0, BollingerBand::Lower);
        let (mut u, mut m, mut l) = (None, None, None);
        for b in &bars {
            u = upper.update(b);
            m = mid.update(b);
            l = lower.update(b);
        }
        assert!(u.unwrap() > m.unwrap());
        assert!(l.unwrap() < m.unwrap());
    }
}
