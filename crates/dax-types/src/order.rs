//! Order types for the DAX matching engine.
//!
//! Limit orders rest in the book and commit their escrow at creation.
//! Market orders never rest: they exist for one matching pass and are then
//! recorded as closed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DaxError, OrderId, Result, SYMBOL_WIDTH, Symbol, TradingPair, UserId};

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side a market order of this side matches against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Decode a fixed-width, blank-padded side tag (`buy` / `sell`).
    pub fn from_padded(raw: &[u8; SYMBOL_WIDTH]) -> Result<Self> {
        let end = raw
            .iter()
            .rposition(|b| *b != 0 && *b != b' ')
            .map_or(0, |i| i + 1);
        let text = std::str::from_utf8(&raw[..end])
            .map_err(|_| DaxError::InvalidSide(hex::encode(&raw[..end])))?;
        text.parse()
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for OrderSide {
    type Err = DaxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(DaxError::InvalidSide(s.to_string())),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
            Self::Market => write!(f, "MARKET"),
        }
    }
}

/// Lifecycle status of an order.
///
/// `Open -> PartiallyFilled -> Closed`, or `Open -> Closed` directly.
/// Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Closed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Why an order reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// Resting quantity reached zero.
    Filled,
    /// The owner cancelled the resting order.
    Cancelled,
    /// A market order finished its matching pass.
    Executed,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Executed => write!(f, "EXECUTED"),
        }
    }
}

/// Core order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: UserId,
    pub pair: TradingPair,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub status: OrderStatus,
    /// Quote-asset price per unit of `pair.first`. `None` for market orders.
    pub price: Option<Decimal>,
    /// Remaining unfilled quantity of `pair.first`.
    pub quantity: Decimal,
    /// Quantity at creation.
    pub original_quantity: Decimal,
    pub close_reason: Option<CloseReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A new, open limit order.
    #[must_use]
    pub fn limit(
        id: OrderId,
        owner: UserId,
        pair: TradingPair,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner,
            pair,
            side,
            kind: OrderKind::Limit,
            status: OrderStatus::Open,
            price: Some(price),
            quantity,
            original_quantity: quantity,
            close_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A transient market order.
    #[must_use]
    pub fn market(
        id: OrderId,
        owner: UserId,
        pair: TradingPair,
        side: OrderSide,
        quantity: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner,
            pair,
            side,
            kind: OrderKind::Market,
            status: OrderStatus::Open,
            price: None,
            quantity,
            original_quantity: quantity,
            close_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quote amount owed for `qty` units at this order's price.
    pub fn quote_for(&self, qty: Decimal) -> Result<Decimal> {
        let price = self.price.unwrap_or(Decimal::ZERO);
        qty.checked_mul(price).ok_or(DaxError::ArithmeticOverflow)
    }

    /// The `(symbol, amount)` a resting limit order must hold committed
    /// for its remaining quantity.
    pub fn required_escrow(&self) -> Result<(Symbol, Decimal)> {
        match self.side {
            OrderSide::Sell => Ok((self.pair.first, self.quantity)),
            OrderSide::Buy => Ok((self.pair.second, self.quote_for(self.quantity)?)),
        }
    }

    /// Reduce the remaining quantity by a fill, advancing the status.
    pub fn apply_fill(&mut self, qty: Decimal) {
        self.quantity -= qty;
        self.updated_at = Utc::now();
        if self.quantity.is_zero() {
            self.close(CloseReason::Filled);
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }
    }

    /// Move the order to `Closed`.
    pub fn close(&mut self, reason: CloseReason) {
        self.status = OrderStatus::Closed;
        self.close_reason = Some(reason);
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != OrderStatus::Closed
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.quantity.is_zero()
    }

    #[must_use]
    pub fn filled_qty(&self) -> Decimal {
        self.original_quantity - self.quantity
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy_pair() -> TradingPair {
        TradingPair::new(
            Symbol::new("TOKEN").expect("valid symbol"),
            Symbol::new("HYDRO").expect("valid symbol"),
        )
    }

    pub fn dummy_limit(id: u64, side: OrderSide, price: Decimal, qty: Decimal) -> Self {
        Self::limit(OrderId(id), UserId::new(), Self::dummy_pair(), side, qty, price)
    }
}
