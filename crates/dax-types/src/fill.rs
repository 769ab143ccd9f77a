//! Fill records produced by the matching engine.
//!
//! A [`Fill`] is the immutable record of one atomic exchange between a
//! market order (taker) and a resting limit order (maker), executed at the
//! maker's price.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FillId, OrderId, OrderSide, TradingPair, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Deterministic from the taker order id and fill sequence.
    pub id: FillId,
    pub pair: TradingPair,
    /// The market order.
    pub taker_order_id: OrderId,
    pub taker: UserId,
    /// The resting limit order.
    pub maker_order_id: OrderId,
    pub maker: UserId,
    /// Execution price: the resting order's limit price.
    pub price: Decimal,
    /// Executed quantity of `pair.first`.
    pub quantity: Decimal,
    /// `price × quantity`, paid in `pair.second`.
    pub quote_amount: Decimal,
    /// Which side the taker was on.
    pub taker_side: OrderSide,
    pub executed_at: DateTime<Utc>,
}

impl Fill {
    #[must_use]
    pub fn taker_is_buyer(&self) -> bool {
        self.taker_side == OrderSide::Buy
    }

    /// `(buyer, seller)` of this fill.
    #[must_use]
    pub fn counterparties(&self) -> (UserId, UserId) {
        if self.taker_is_buyer() {
            (self.taker, self.maker)
        } else {
            (self.maker, self.taker)
        }
    }
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fill[{}] {} {} {} @ {} = {}",
            self.id, self.pair, self.taker_side, self.quantity, self.price, self.quote_amount,
        )
    }
}
