//! Escrow account model.
//!
//! Every (user, token) account has an `available` balance (withdrawable,
//! usable for new orders and market-order payments) and a `committed`
//! balance (locked behind the user's resting limit orders).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Escrowed balance for a single (user, symbol).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscrowAccount {
    /// Free for withdrawal and new orders.
    pub available: Decimal,
    /// Committed to open limit orders.
    pub committed: Decimal,
}

impl EscrowAccount {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Decimal::ZERO,
            committed: Decimal::ZERO,
        }
    }

    /// Total escrowed balance (available + committed), saturating at
    /// `Decimal::MAX`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available.saturating_add(self.committed)
    }

    /// Total escrowed balance, or `None` if it does not fit.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.available.checked_add(self.committed)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.committed.is_zero()
    }
}

impl Default for EscrowAccount {
    fn default() -> Self {
        Self::new()
    }
}
