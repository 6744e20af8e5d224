//! Donchian Channel — highest high / lowest low over a `period`-bar window.
//! Upper and lower bands are separate indicator instances.

use serde::{Deserialize, Serialize};
use super::Indicator;
use crate::domain::Bar;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    window: VecDeque<f64>,
}

impl Donchian {
    pub fn new(period: usize, band: DonchianBand) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band,
            window: VecDeque::with_capacity(period),
        }
    }

    pub fn upper(period: usize) -> Self {
        Self::new(period, DonchianBand::Upper)
    }

    pub fn lower(period: usize) -> Self {
        Self::new(period, DonchianBand::Lower)
    }
}

impl Indicator for Donchian {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let sample = match self.band {
            DonchianBand::Upper => bar.high,
            DonchianBand::Lower => bar.low,
        };
        self.window.push_back(sample);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }
        Some(match self.band {
            DonchianBand::Upper => self.window.iter().cloned().fold(f64::MIN, f64::max),
            DonchianBand::Lower => self.window.iter().cloned().fold(f64::MAX, f64::min),
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
    fn upper_tracks_rolling_max_high() {
        let bars = make_bars(&[10.0, 12.0, 9.0, 15.0, 11.0]);
        let mut d = Donchian::upper(3);
        let values: Vec<Option<f64>> = bars.iter().map(|b| d.update(b)).collect();
        assert!(values[0].is_none());
        assert!(values[1].is_none());
        assert!(values[2].is_some());
        assert_approx(values[3].unwrap(), bars[3].high, DEFAULT_EPSILON);
    }

    #[test]
    fn lower_tracks_rolling_min_low() {
        let bars = make_bars(&[10.0, 12.0, 9.0, 15.0, 11.0]);
        let mut d = Donchian::lower(3);
        let values: Vec<Option<f64>> = bars.iter().map(|b| d.update(b)).collect();
        let expected_min = bars[1..4].iter().map(|b| b.low).fold(f64::MAX, f64::min);
        assert_approx(values[3].unwrap(), expected_min, DEFAULT_EPSILON);
    }
}
