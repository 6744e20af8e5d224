//! Parabolic SAR — Wilder's acceleration-factor stop-and-reverse system.
//! Inherently sequential: tracks trend direction, the extreme point (EP),
//! and the acceleration factor (AF) bar to bar.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
struct State {
    is_long: bool,
    sar: f64,
    ep: f64,
    af: f64,
    prev_high: f64,
    prev_low: f64,
    prev2_high: Option<f64>,
    prev2_low: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ParabolicSar {
    af_start: f64,
    af_step: f64,
    af_max: f64,
    first_bar: Option<(f64, f64, f64)>, // (high, low, close)
    state: Option<State>,
}

impl ParabolicSar {
    pub fn new(af_start: f64, af_step: f64, af_max: f64) -> Self {
        assert!(af_start > 0.0, "AF start must be > 0");
        assert!(af_step > 0.0, "AF step must be > 0");
        assert!(af_max >= af_start, "AF max must be >= AF start");
        Self {
            af_start,
            af_step,
            af_max,
            first_bar: None,
            state: None,
        }
    }

    pub fn default_params() -> Self {
        Self::new(0.02, 0.02, 0.20)
    }
}

impl Indicator for ParabolicSar {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let Some((h0, l0, c0)) = self.first_bar else {
            self.first_bar = Some((bar.high, bar.low, bar.close));
            return None;
        };

        let Some(state) = self.state.as_mut() else {
            let is_long = bar.close >= c0;
            let (sar, ep) = if is_long { (l0, bar.high) } else { (h0, bar.low) };
            self.state = Some(State {
                is_long,
                sar,
                ep,
                af: self.af_start,
                prev_high: bar.high,
                prev_low: bar.low,
                prev2_high: None,
                prev2_low: None,
            });
            return Some(sar);
        };

        let mut new_sar = state.sar + state.af * (state.ep - state.sar);

        if state.is_long {
            new_sar = new_sar.min(state.prev_low);
            if let Some(p2) = state.prev2_low {
                new_sar = new_sar.min(p2);
            }
            if bar.low < new_sar {
                state.is_long = false;
                new_sar = state.ep;
                state.ep = bar.low;
                state.af = self.af_start;
            } else if bar.high > state.ep {
                state.ep = bar.high;
                state.af = (state.af + self.af_step).min(self.af_max);
            }
        } else {
            new_sar = new_sar.max(state.prev_high);
            if let Some(p2) = state.prev2_high {
                new_sar = new_sar.max(p2);
            }
            if bar.high > new_sar {
                state.is_long = true;
                new_sar = state.ep;
                state.ep = bar.high;
                state.af = self.af_start;
            } else if bar.low < state.ep {
                state.ep = bar.low;
                state.af = (state.af + self.af_step).min(self.af_max);
            }
        }

        state.sar = new_sar;
        state.prev2_high = Some(state.prev_high);
        state.prev2_low = Some(state.prev_low);
        state.prev_high = bar.high;
        state.prev_low = bar.low;
        Some(new_sar)
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn reset(&mut self) {
        self.first_bar = None;
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| {
                Bar::new(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::days(i as i64),
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

    #[test]
    fn tracks_uptrend_without_panicking() {
        let bars = ohlc_bars(&[
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 104.0, 100.0, 103.0),
            (103.0, 106.0, 102.0, 105.0),
            (105.0, 108.0, 104.0, 107.0),
            (107.0, 110.0, 106.0, 109.0),
        ]);
        let mut sar = ParabolicSar::default_params();
        let mut last = None;
        for b in &bars {
            last = sar.update(b).or(last);
        }
        assert!(last.is_some());
        assert!(sar.is_ready());
    }
}
