//! Relative Strength Index — Wilder-smoothed average gain/loss.
//! `RSI = 100 - 100/(1 + avg_gain/avg_loss)`. `avg_loss == 0` → 100,
//! `avg_gain == 0` → 0, both zero (no movement) → 50.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    seed_gain: f64,
    seed_loss: f64,
    seed_count: usize,
    avg_gain: f64,
    avg_loss: f64,
    seeded: bool,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            prev_close: None,
            seed_gain: 0.0,
            seed_loss: 0.0,
            seed_count: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            seeded: false,
        }
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 && self.avg_gain == 0.0 {
            50.0
        } else if self.avg_loss == 0.0 {
            100.0
        } else if self.avg_gain == 0.0 {
            0.0
        } else {
            100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss)
        }
    }
}

impl Indicator for Rsi {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev = match self.prev_close.replace(bar.close) {
            Some(p) => p,
            None => return None,
        };
        let change = bar.close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if self.seeded {
            let alpha = 1.0 / self.period as f64;
            self.avg_gain = alpha * gain + (1.0 - alpha) * self.avg_gain;
            self.avg_loss = alpha * loss + (1.0 - alpha) * self.avg_loss;
            return Some(self.value());
        }

        self.seed_gain += gain;
        self.seed_loss += loss;
        self.seed_count += 1;
        if self.seed_count == self.period {
            self.avg_gain = self.seed_gain / self.period as f64;
            self.avg_loss = self.seed_loss / self.period as f64;
            self.seeded = true;
            return Some(self.value());
        }
        None
    }

    fn is_ready(&self) -> bool {
        self.seeded
    }

    fn reset(&mut self) {
        *self = Rsi::new(self.period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn all_gains_saturates_at_100() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let mut rsi = Rsi::new(3);
        let values: Vec<Option<f64>> = bars.iter().map(|b| rsi.update(b)).collect();
        assert_approx(values[3].unwrap(), 100.0, 1e-6);
    }

    #[test]
    fn all_losses_floors_at_0() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let mut rsi = Rsi::new(3);
        let values: Vec<Option<f64>> = bars.iter().map(|b| rsi.update(b)).collect();
        assert_approx(values[3].unwrap(), 0.0, 1e-6);
    }

    #[test]
    fn stays_within_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let mut rsi = Rsi::new(3);
        for b in &bars {
            if let Some(v) = rsi.update(b) {
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}
