use super::PositionSizer;
use crate::domain::bar::Side;

/// Sizes so that a stop-loss hit loses exactly `risk_pct` of equity:
/// `size = equity · risk_pct / stop_loss_pct`.
///
/// Falls back to `default_stop_loss_pct` when the order carries no stop.
#[derive(Debug, Clone, Copy)]
pub struct RiskPctSizer {
    pub risk_pct: f64,
    pub default_stop_loss_pct: f64,
}

impl RiskPctSizer {
    pub fn new(risk_pct: f64, default_stop_loss_pct: f64) -> Self {
        Self {
            risk_pct,
            default_stop_loss_pct,
        }
    }
}

impl PositionSizer for RiskPctSizer {
    fn size(&self, equity: f64, _side: Side, _price: f64, _symbol: &str, stop_loss_pct: Option<f64>) -> f64 {
        let sl = stop_loss_pct.filter(|v| *v > 0.0).unwrap_or(self.default_stop_loss_pct);
        equity * self.risk_pct / sl
    }
}
