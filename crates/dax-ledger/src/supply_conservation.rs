//! Supply conservation invariant checker.
//!
//! Invariant enforced after every state-changing operation:
//! ```text
//! ∀ symbol: Σ(available + committed) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! Fills only move balances between users, so they never change the
//! expected supply. The tracker keeps the net outstanding amount per
//! symbol, which is bounded by what the ledger can hold.

use std::collections::{BTreeMap, HashMap};

use dax_types::{DaxError, Result, Symbol};
use rust_decimal::Decimal;

use crate::escrow_ledger::EscrowLedger;

/// Tracks per-symbol net deposits and validates them against the ledger.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    outstanding: HashMap<Symbol, Decimal>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected supply after a deposit of `amount`, without recording it.
    ///
    /// # Errors
    /// Returns [`DaxError::ArithmeticOverflow`] if the total would not fit.
    pub fn check_deposit(&self, symbol: Symbol, amount: Decimal) -> Result<Decimal> {
        self.expected_supply(symbol)
            .checked_add(amount)
            .ok_or(DaxError::ArithmeticOverflow)
    }

    /// Expected supply after a withdrawal of `amount`, without recording it.
    ///
    /// # Errors
    /// Returns [`DaxError::ArithmeticOverflow`] if the total would not fit.
    pub fn check_withdrawal(&self, symbol: Symbol, amount: Decimal) -> Result<Decimal> {
        self.expected_supply(symbol)
            .checked_sub(amount)
            .ok_or(DaxError::ArithmeticOverflow)
    }

    /// # Errors
    /// Returns [`DaxError::ArithmeticOverflow`] and records nothing if the
    /// total would not fit.
    pub fn record_deposit(&mut self, symbol: Symbol, amount: Decimal) -> Result<()> {
        let next = self.check_deposit(symbol, amount)?;
        self.outstanding.insert(symbol, next);
        Ok(())
    }

    /// # Errors
    /// Returns [`DaxError::ArithmeticOverflow`] and records nothing if the
    /// total would not fit.
    pub fn record_withdrawal(&mut self, symbol: Symbol, amount: Decimal) -> Result<()> {
        let next = self.check_withdrawal(symbol, amount)?;
        self.outstanding.insert(symbol, next);
        Ok(())
    }

    /// Expected total supply: deposits - withdrawals.
    #[must_use]
    pub fn expected_supply(&self, symbol: Symbol) -> Decimal {
        self.outstanding
            .get(&symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Check one symbol against an observed supply.
    ///
    /// # Errors
    /// Returns [`DaxError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, symbol: Symbol, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply(symbol);
        if actual_supply != expected {
            return Err(DaxError::SupplyInvariantViolation {
                reason: format!("{symbol}: actual supply {actual_supply} != expected {expected}"),
            });
        }
        Ok(())
    }

    /// Check every tracked symbol against the ledger, and that no account
    /// is negative.
    pub fn verify_ledger(&self, ledger: &EscrowLedger) -> Result<()> {
        if ledger.has_negative_balance() {
            return Err(DaxError::SupplyInvariantViolation {
                reason: "negative escrow balance".into(),
            });
        }
        for symbol in self.tracked_symbols() {
            self.verify(symbol, ledger.total_supply(symbol)?)?;
        }
        Ok(())
    }

    /// Every symbol with a recorded deposit or withdrawal, sorted.
    #[must_use]
    pub fn tracked_symbols(&self) -> Vec<Symbol> {
        self.snapshot().into_keys().collect()
    }

    /// Expected supply of every tracked symbol, ordered by symbol.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Symbol, Decimal> {
        self.outstanding.iter().map(|(s, d)| (*s, *d)).collect()
    }
}
