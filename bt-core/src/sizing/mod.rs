//! Position sizing strategies.
//!
//! A sizer is a pure function over portfolio/market state; it never mutates
//! anything and never sees order history. The portfolio calls it only when
//! the order itself does not carry an explicit `size_usd` override.

mod equity_pct;
mod fixed;
mod kelly;
mod risk_pct;

pub use equity_pct::EquityPctSizer;
pub use fixed::FixedSizer;
pub use kelly::KellySizer;
pub use risk_pct::RiskPctSizer;

use crate::domain::bar::Side;

/// Computes an order's notional size in quote currency.
pub trait PositionSizer: std::fmt::Debug {
    /// `stop_loss_pct` is the order's configured stop distance, if any —
    /// sizers that need it (risk-based) fall back to their own default when
    /// it is `None`.
    fn size(
        &self,
        equity: f64,
        side: Side,
        price: f64,
        symbol: &str,
        stop_loss_pct: Option<f64>,
    ) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizers_are_object_safe() {
        let sizers: Vec<Box<dyn PositionSizer>> = vec![
            Box::new(FixedSizer::new(1000.0)),
            Box::new(EquityPctSizer::new(0.1, None, None)),
        ];
        for sizer in &sizers {
            let size = sizer.size(100_000.0, Side::Long, 50.0, "SPY", Some(0.02));
            assert!(size > 0.0);
        }
    }
}
