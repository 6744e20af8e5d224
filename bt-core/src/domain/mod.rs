//! Domain types: bars, orders, positions, fills, trades, portfolio, ids.

pub mod bar;
pub mod fill;
pub mod ids;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use bar::{Bar, Side};
pub use fill::Fill;
pub use ids::{ConfigHash, FillId, IdGen, OrderId, PendingToken, RunId, TradeId};
pub use order::{LimitOrder, MarketOrder, Order, OrderParams, StopOrder};
pub use portfolio::Portfolio;
pub use position::{BreakevenState, PartialTpState, Position, TrailingState};
pub use trade::{ExitReason, TradeRecord};

/// Symbol type alias.
pub type Symbol = String;
