//! Average Directional Index (Wilder).
//!
//! Two-stage Wilder smoothing: first +DM/-DM/TR, yielding a directional
//! index (DX) per bar; DX is itself Wilder-smoothed into ADX. Both stages
//! need `period` samples to seed, so ADX needs roughly `2 * period` bars
//! of warmup.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    prev: Option<(f64, f64, f64)>, // (high, low, close)
    seed_tr: f64,
    seed_plus: f64,
    seed_minus: f64,
    seed_count: usize,
    smoothed_tr: Option<f64>,
    smoothed_plus: Option<f64>,
    smoothed_minus: Option<f64>,
    dx_seed_sum: f64,
    dx_seed_count: usize,
    adx: Option<f64>,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            prev: None,
            seed_tr: 0.0,
            seed_plus: 0.0,
            seed_minus: 0.0,
            seed_count: 0,
            smoothed_tr: None,
            smoothed_plus: None,
            smoothed_minus: None,
            dx_seed_sum: 0.0,
            dx_seed_count: 0,
            adx: None,
        }
    }

    fn feed_dx(&mut self, dx: f64) -> Option<f64> {
        if let Some(prev) = self.adx {
            let alpha = 1.0 / self.period as f64;
            let next = alpha * dx + (1.0 - alpha) * prev;
            self.adx = Some(next);
            return Some(next);
        }
        self.dx_seed_sum += dx;
        self.dx_seed_count += 1;
        if self.dx_seed_count == self.period {
            let seed = self.dx_seed_sum / self.period as f64;
            self.adx = Some(seed);
            return Some(seed);
        }
        None
    }
}

impl Indicator for Adx {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let (ph, pl, pc) = match self.prev.replace((bar.high, bar.low, bar.close)) {
            Some(p) => p,
            None => return None,
        };

        let up_move = bar.high - ph;
        let down_move = pl - bar.low;
        let plus_dm = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
        let minus_dm = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
        let tr = (bar.high - bar.low).max((bar.high - pc).abs()).max((bar.low - pc).abs());

        let (smoothed_tr, smoothed_plus, smoothed_minus) = if let (Some(t), Some(p), Some(m)) =
            (self.smoothed_tr, self.smoothed_plus, self.smoothed_minus)
        {
            let alpha = 1.0 / self.period as f64;
            let nt = alpha * tr + (1.0 - alpha) * t;
            let np = alpha * plus_dm + (1.0 - alpha) * p;
            let nm = alpha * minus_dm + (1.0 - alpha) * m;
            self.smoothed_tr = Some(nt);
            self.smoothed_plus = Some(np);
            self.smoothed_minus = Some(nm);
            (nt, np, nm)
        } else {
            self.seed_tr += tr;
            self.seed_plus += plus_dm;
            self.seed_minus += minus_dm;
            self.seed_count += 1;
            if self.seed_count < self.period {
                return None;
            }
            let t = self.seed_tr / self.period as f64;
            let p = self.seed_plus / self.period as f64;
            let m = self.seed_minus / self.period as f64;
            self.smoothed_tr = Some(t);
            self.smoothed_plus = Some(p);
            self.smoothed_minus = Some(m);
            (t, p, m)
        };

        if smoothed_tr == 0.0 {
            return self.feed_dx(0.0);
        }
        let di_plus = 100.0 * smoothed_plus / smoothed_tr;
        let di_minus = 100.0 * smoothed_minus / smoothed_tr;
        let di_sum = di_plus + di_minus;
        let dx = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (di_plus - di_minus).abs() / di_sum
        };
        self.feed_dx(dx)
    }

    fn is_ready(&self) -> bool {
        self.adx.is_some()
    }

    fn reset(&mut self) {
        *self = Adx::new(self.period);
    }
}
