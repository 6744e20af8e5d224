use super::PositionSizer;
use crate::domain::bar::Side;

/// Always sizes to the same fixed notional, regardless of equity or price.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizer {
    pub usd: f64,
}

impl FixedSizer {
    pub fn new(usd: f64) -> Self {
        Self { usd }
    }
}

impl PositionSizer for FixedSizer {
    fn size(&self, _equity: f64, _side: Side, _price: f64, _symbol: &str, _stop_loss_pct: Option<f64>) -> f64 {
        self.usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_equity_and_price() {
        let sizer = FixedSizer::new(2500.0);
        assert_eq!(sizer.size(10_000.0, Side::Long, 1.0, "X", None), 2500.0);
        assert_eq!(sizer.size(1_000_000.0, Side::Short, 999.0, "Y", Some(0.05)), 2500.0);
    }
}
