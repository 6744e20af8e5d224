//! Keltner Channel — EMA of close, plus/minus an ATR multiplier. Composes
//! an internal `Ema` and `Atr` sharing one period rather than re-deriving
//! their recursions.

use serde::{Deserialize, Serialize};
use super::{Atr, Ema, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeltnerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Keltner {
    atr_mult: f64,
    band: KeltnerBand,
    ema: Ema,
    atr: Atr,
}

impl Keltner {
    pub fn new(period: usize, atr_mult: f64, band: KeltnerBand) -> Self {
        Self {
            atr_mult,
            band,
            ema: Ema::new(period),
            atr: Atr::new(period),
        }
    }
}

impl Indicator for Keltner {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let mid = self.ema.update(bar);
        let range = self.atr.update(bar);
        let (mid, range) = (mid?, range?);
        Some(match self.band {
            KeltnerBand::Middle => mid,
            KeltnerBand::Upper => mid + self.atr_mult * range,
            KeltnerBand::Lower => mid - self.atr_mult * range,
        })
    }

    fn is_ready(&self) -> bool {
        self.ema.is_ready() && self.atr.is_ready()
    }

    fn reset(&mut self) {
        self.ema.reset();
        self.atr.reset();
    }
}
