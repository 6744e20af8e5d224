use super::PositionSizer;
use crate::domain::bar::Side;

/// Sizes to a fixed percentage of current equity, clamped to `[min_usd, max_usd]`.
#[derive(Debug, Clone, Copy)]
pub struct EquityPctSizer {
    pub pct: f64,
    pub min_usd: Option<f64>,
    pub max_usd: Option<f64>,
}

impl EquityPctSizer {
    pub fn new(pct: f64, min_usd: Option<f64>, max_usd: Option<f64>) -> Self {
        Self {
            pct,
            min_usd,
            max_usd,
        }
    }
}

impl PositionSizer for EquityPctSizer {
    fn size(&self, equity: f64, _side: Side, _price: f64, _symbol: &str, _stop_loss_pct: Option<f64>) -> f64 {
        let mut size = equity * self.pct;
        if let Some(min) = self.min_usd {
            size = size.max(min);
        }
        if let Some(max) = self.max_usd {
            size = size.min(max);
        }
        size
    }
}
