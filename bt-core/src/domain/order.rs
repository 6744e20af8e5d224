//! Order — a request emitted by a strategy, executed on a later bar.
//!
//! Modeled as a tagged sum type rather than duck-typed market/limit/stop
//! objects (see SPEC_FULL.md §9): the processor's follow-up dispatcher
//! matches on the variant instead of probing for attributes.

use super::bar::Side;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Common parameters every order variant carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderParams {
    /// Explicit position size in quote currency. When `None`, the
    /// portfolio's default size or configured sizer is consulted.
    pub size_usd: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub breakeven_trigger_pct: Option<f64>,
    pub breakeven_lock_pct: Option<f64>,
    pub trailing_pct: Option<f64>,
    pub trailing_activation_pct: Option<f64>,
    pub partial_tp_pct: Option<f64>,
    pub partial_tp_new_tp_pct: Option<f64>,
    /// Clear pending limit/stop queues before this order is enqueued.
    pub cancel_pending_limits: bool,
    /// Partitions position-count and direction enforcement.
    pub group: Option<String>,
}

impl OrderParams {
    /// Every percentage here is an unsigned fractional distance from entry
    /// price — direction is applied separately via `Side` when the stop/TP
    /// price is derived, so a negative or zero-or-above-one value here is
    /// never meaningful for either side. `partial_tp_pct` is additionally a
    /// fraction of the position to close, so it must not exceed 1.0.
    pub fn validate(&self) -> Result<(), EngineError> {
        let pct_fields = [
            ("take_profit_pct", self.take_profit_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("breakeven_trigger_pct", self.breakeven_trigger_pct),
            ("breakeven_lock_pct", self.breakeven_lock_pct),
            ("trailing_pct", self.trailing_pct),
            ("trailing_activation_pct", self.trailing_activation_pct),
            ("partial_tp_pct", self.partial_tp_pct),
            ("partial_tp_new_tp_pct", self.partial_tp_new_tp_pct),
        ];
        for (name, value) in pct_fields {
            if let Some(v) = value {
                if !(v > 0.0 && v <= 1.0) {
                    return Err(EngineError::InvalidOrderParams(format!(
                        "{name} must be in (0.0, 1.0], got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A market order: fills at the next bar's open with adverse slippage and
/// the taker fee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketOrder {
    pub side: Side,
    pub params: OrderParams,
}

/// A limit order: fills when a later bar's extremum crosses `limit_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrder {
    pub side: Side,
    pub limit_price: f64,
    /// Bars after which an unfilled order is dropped. 0 disables the timeout.
    pub timeout_bars: u32,
    pub use_maker_fee: bool,
    /// Skip the fill check while total open positions is below this
    /// threshold, though the bar still counts toward the timeout.
    pub min_positions: Option<usize>,
    /// Merge into the newest position in the same group instead of opening
    /// a new one. If no position exists in the group, the order keeps
    /// waiting (bars-elapsed still advances, timeout still applies).
    pub merge_position: bool,
    pub params: OrderParams,
}

/// A stop order: triggers when a later bar's extremum crosses `stop_price`
/// in the breakout direction, then fills as a market entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopOrder {
    pub side: Side,
    pub stop_price: f64,
    pub timeout_bars: u32,
    pub params: OrderParams,
}

/// A strategy-returned order, or the sentinel that clears pending queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Order {
    Market(MarketOrder),
    Limit(LimitOrder),
    Stop(StopOrder),
    /// Clears both the limits and stops queues immediately. The
    /// `cancel_pending_limits` flag on other variants lives on the variant
    /// itself, not on this sentinel (SPEC_FULL.md §9).
    CancelPendingLimits,
}

impl Order {
    pub fn market(side: Side) -> Self {
        Order::Market(MarketOrder {
            side,
            params: OrderParams::default(),
        })
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            Order::Market(o) => o.params.group.as_deref(),
            Order::Limit(o) => o.params.group.as_deref(),
            Order::Stop(o) => o.params.group.as_deref(),
            Order::CancelPendingLimits => None,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Order::Market(o) => Some(o.side),
            Order::Limit(o) => Some(o.side),
            Order::Stop(o) => Some(o.side),
            Order::CancelPendingLimits => None,
        }
    }

    pub fn params(&self) -> Option<&OrderParams> {
        match self {
            Order::Market(o) => Some(&o.params),
            Order::Limit(o) => Some(&o.params),
            Order::Stop(o) => Some(&o.params),
            Order::CancelPendingLimits => None,
        }
    }

    pub fn cancel_pending_limits_flag(&self) -> bool {
        match self {
            Order::Market(o) => o.params.cancel_pending_limits,
            Order::Limit(o) => o.params.cancel_pending_limits,
            Order::Stop(o) => o.params.cancel_pending_limits,
            Order::CancelPendingLimits => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_order_builder_defaults() {
        let order = Order::market(Side::Long);
        assert_eq!(order.side(), Some(Side::Long));
        assert_eq!(order.group(), None);
        assert!(!order.cancel_pending_limits_flag());
    }

    #[test]
    fn group_tag_is_read_through_variants() {
        let order = Order::Limit(LimitOrder {
            side: Side::Short,
            limit_price: 98.0,
            timeout_bars: 3,
            use_maker_fee: true,
            min_positions: None,
            merge_position: false,
            params: OrderParams {
                group: Some("scalp".into()),
                ..Default::default()
            },
        });
        assert_eq!(order.group(), Some("scalp"));
        assert_eq!(order.side(), Some(Side::Short));
    }

    #[test]
    fn cancel_pending_limits_sentinel_has_no_side_or_group() {
        let order = Order::CancelPendingLimits;
        assert_eq!(order.side(), None);
        assert_eq!(order.group(), None);
        assert!(!order.cancel_pending_limits_flag());
    }

    #[test]
    fn validate_rejects_out_of_range_percentages() {
        let bad = OrderParams { stop_loss_pct: Some(1.5), ..Default::default() };
        assert!(bad.validate().is_err());

        let also_bad = OrderParams { partial_tp_pct: Some(0.0), ..Default::default() };
        assert!(also_bad.validate().is_err());

        let negative = OrderParams { trailing_pct: Some(-0.02), ..Default::default() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn validate_accepts_sane_percentages() {
        let good = OrderParams {
            stop_loss_pct: Some(0.02),
            take_profit_pct: Some(0.05),
            partial_tp_pct: Some(0.5),
            ..Default::default()
        };
        assert!(good.validate().is_ok());
        assert!(OrderParams::default().validate().is_ok());
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = Order::Stop(StopOrder {
            side: Side::Long,
            stop_price: 110.0,
            timeout_bars: 0,
            params: OrderParams {
                stop_loss_pct: Some(0.03),
                take_profit_pct: Some(0.05),
                ..Default::default()
            },
        });
        let json = serde_json::to_string(&order).unwrap();
        let deser: Order = serde_json::from_str(&json).unwrap();
        match deser {
            Order::Stop(s) => {
                assert_eq!(s.stop_price, 110.0);
                assert_eq!(s.params.stop_loss_pct, Some(0.03));
            }
            _ => panic!("wrong variant after roundtrip"),
        }
    }
}
