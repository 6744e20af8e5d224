//! TradeRecord — a completed round trip, or partial slice, of a position.

use super::bar::Side;
use super::ids::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position (or a slice of one) was closed.
///
/// `_GAP` variants indicate the bar's open had already crossed the level, so
/// the fill happened at the open rather than the configured level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    StopLossGap,
    TakeProfit,
    TakeProfitGap,
    Breakeven,
    BreakevenGap,
    TrailingStop,
    TrailingStopGap,
    PartialTp,
    Signal,
}

impl ExitReason {
    /// Fold a `_GAP` variant into its base reason, for the results
    /// aggregator's exit-reason histogram.
    pub fn base(self) -> ExitReason {
        match self {
            ExitReason::StopLossGap => ExitReason::StopLoss,
            ExitReason::TakeProfitGap => ExitReason::TakeProfit,
            ExitReason::BreakevenGap => ExitReason::Breakeven,
            ExitReason::TrailingStopGap => ExitReason::TrailingStop,
            other => other,
        }
    }

    pub fn is_gap(self) -> bool {
        matches!(
            self,
            ExitReason::StopLossGap
                | ExitReason::TakeProfitGap
                | ExitReason::BreakevenGap
                | ExitReason::TrailingStopGap
        )
    }
}

/// A completed trade: a full exit, or a partial slice of a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub symbol: String,
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    /// Quote-currency size of this slice (not necessarily the full position).
    pub size_usd: f64,
    /// Net of `fees` — a slice whose gross gain is smaller than its fees
    /// is a loser, not a winner.
    pub pnl_usd: f64,
    /// Gross, unaffected by fees.
    pub pnl_pct: f64,
    /// Entry + exit fees attributable to this slice.
    pub fees: f64,
    pub reason: ExitReason,
    pub is_partial: bool,
    pub group: Option<String>,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.pnl_usd > 0.0
    }
}
