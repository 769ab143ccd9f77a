//! Events emitted by the exchange core for observers (UI, indexers).
//!
//! Each event carries a snapshot of the affected order or account taken
//! right after the state change that produced it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EscrowAccount, Fill, Order, Symbol, TokenAddress, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExchangeEvent {
    TokenWhitelisted {
        symbol: Symbol,
        token: TokenAddress,
        pairs: Vec<Symbol>,
    },
    Deposited {
        user: UserId,
        symbol: Symbol,
        amount: Decimal,
        account: EscrowAccount,
    },
    Withdrawn {
        user: UserId,
        symbol: Symbol,
        amount: Decimal,
        account: EscrowAccount,
    },
    OrderOpened {
        order: Order,
    },
    OrderPartiallyFilled {
        order: Order,
        fill: Fill,
    },
    /// Filled, cancelled, or an executed market order. The reason is in
    /// `order.close_reason`.
    OrderClosed {
        order: Order,
    },
}

impl ExchangeEvent {
    /// Stable event name, used as the log target field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenWhitelisted { .. } => "TokenWhitelisted",
            Self::Deposited { .. } => "Deposited",
            Self::Withdrawn { .. } => "Withdrawn",
            Self::OrderOpened { .. } => "OrderOpened",
            Self::OrderPartiallyFilled { .. } => "OrderPartiallyFilled",
            Self::OrderClosed { .. } => "OrderClosed",
        }
    }
}
