use super::PositionSizer;
use crate::domain::bar::Side;
use crate::error::EngineError;

/// Kelly-criterion sizing with a fractional multiplier and a hard equity cap.
///
/// `win_rate`, `avg_win`, `avg_loss` and `fraction` are validated once at
/// construction, not on every call — a misconfigured sizer is a setup
/// mistake the caller should hear about immediately, not a per-bar concern.
#[derive(Debug, Clone, Copy)]
pub struct KellySizer {
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    fraction: f64,
    equity_cap_pct: Option<f64>,
}

impl KellySizer {
    pub fn try_new(
        win_rate: f64,
        avg_win: f64,
        avg_loss: f64,
        fraction: f64,
        equity_cap_pct: Option<f64>,
    ) -> Result<Self, EngineError> {
        if !(0.0 < win_rate && win_rate < 1.0) {
            return Err(EngineError::InvalidSizerConfig(format!(
                "win_rate must be in (0, 1), got {win_rate}"
            )));
        }
        if avg_win <= 0.0 {
            return Err(EngineError::InvalidSizerConfig(format!(
                "avg_win must be positive, got {avg_win}"
            )));
        }
        if avg_loss <= 0.0 {
            return Err(EngineError::InvalidSizerConfig(format!(
                "avg_loss must be positive, got {avg_loss}"
            )));
        }
        if fraction <= 0.0 {
            return Err(EngineError::InvalidSizerConfig(format!(
                "fraction must be positive, got {fraction}"
            )));
        }
        Ok(Self {
            win_rate,
            avg_win,
            avg_loss,
            fraction,
            equity_cap_pct,
        })
    }

    /// The raw Kelly fraction: `b = avg_win/avg_loss`, `f* = p - (1-p)/b`.
    fn kelly_fraction(&self) -> f64 {
        let b = self.avg_win / self.avg_loss;
        let f_star = self.win_rate - (1.0 - self.win_rate) / b;
        f_star.max(0.0) * self.fraction
    }
}

impl PositionSizer for KellySizer {
    fn size(&self, equity: f64, _side: Side, _price: f64, _symbol: &str, _stop_loss_pct: Option<f64>) -> f64 {
        let mut size = equity * self.kelly_fraction();
        if let Some(cap_pct) = self.equity_cap_pct {
            size = size.min(equity * cap_pct);
        }
        size
    }
}
