//! Fill — an immutable record of one leg of a trade.

use super::bar::Side;
use super::ids::FillId;
use super::trade::ExitReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed leg: an entry, a merge, or an exit (full or partial).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub id: FillId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: Side,
    /// Executed price, post-slippage.
    pub price: f64,
    pub size_usd: f64,
    pub fee: f64,
    pub is_entry: bool,
    /// Present on exit fills; `None` for entries and merges.
    pub reason: Option<ExitReason>,
}

impl Fill {
    /// Net notional: cost for an entry, proceeds for an exit, fee always
    /// deducted from the counterparty's perspective (a cost either way).
    pub fn net_amount(&self) -> f64 {
        self.size_usd - self.fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_fill() -> Fill {
        Fill {
            id: FillId(1),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 9, 31, 0).unwrap(),
            symbol: "SPY".into(),
            side: Side::Long,
            price: 100.5,
            size_usd: 10_000.0,
            fee: 1.5,
            is_entry: true,
            reason: None,
        }
    }

    #[test]
    fn net_amount_deducts_fee() {
        assert_eq!(sample_fill().net_amount(), 9998.5);
    }

    #[test]
    fn exit_fill_carries_reason() {
        let mut fill = sample_fill();
        fill.is_entry = false;
        fill.reason = Some(ExitReason::TakeProfit);
        assert_eq!(fill.reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn fill_serialization_roundtrip() {
        let fill = sample_fill();
        let json = serde_json::to_string(&fill).unwrap();
        let deser: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill.price, deser.price);
        assert_eq!(fill.id, deser.id);
    }
}
