//! Per-user escrow ledger.
//!
//! Tracks per-(user, symbol) balances with available/committed accounting.
//! The external token movement (into or out of custody) happens outside
//! this component; the ledger only records its effect. All mutations are
//! atomic: either the full operation succeeds or every balance is unchanged.

use std::collections::HashMap;

use dax_types::{DaxError, EscrowAccount, Result, Symbol, UserId};
use rust_decimal::Decimal;

use crate::token_registry::TokenRegistry;

/// Which part of the sender's account a transfer leg draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceSource {
    /// Free balance (market-order payments, plain transfers).
    Available,
    /// Balance committed behind a resting limit order.
    Committed,
}

/// One leg of an atomic ledger movement. The receiver is always credited
/// to `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: UserId,
    pub to: UserId,
    pub symbol: Symbol,
    pub amount: Decimal,
    pub source: BalanceSource,
}

impl Transfer {
    #[must_use]
    pub fn available(from: UserId, to: UserId, symbol: Symbol, amount: Decimal) -> Self {
        Self {
            from,
            to,
            symbol,
            amount,
            source: BalanceSource::Available,
        }
    }

    #[must_use]
    pub fn committed(from: UserId, to: UserId, symbol: Symbol, amount: Decimal) -> Self {
        Self {
            from,
            to,
            symbol,
            amount,
            source: BalanceSource::Committed,
        }
    }
}

/// The escrow ledger. Accounts are created lazily on first credit and are
/// never removed; a zero balance stays on record.
///
/// The escrowed total of a symbol never exceeds `Decimal::MAX`, so no
/// account, commitment or fill credit can overflow once a deposit is in.
#[derive(Debug, Default)]
pub struct EscrowLedger {
    accounts: HashMap<(UserId, Symbol), EscrowAccount>,
    escrowed: HashMap<Symbol, Decimal>,
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(DaxError::InvalidQuantity(amount));
    }
    Ok(())
}

impl EscrowLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit that has already reached custody.
    ///
    /// # Errors
    /// - `InvalidQuantity` if `amount <= 0`
    /// - `NotWhitelisted` if the symbol is unknown to `registry`
    /// - `ArithmeticOverflow` if the symbol's escrowed total would not fit
    pub fn deposit(
        &mut self,
        registry: &TokenRegistry,
        user: UserId,
        symbol: Symbol,
        amount: Decimal,
    ) -> Result<EscrowAccount> {
        ensure_positive(amount)?;
        if !registry.is_whitelisted(&symbol) {
            return Err(DaxError::NotWhitelisted(symbol));
        }
        let escrowed = self
            .escrowed_supply(symbol)
            .checked_add(amount)
            .ok_or(DaxError::ArithmeticOverflow)?;
        let mut account = self.balance(user, symbol);
        account.available = account
            .available
            .checked_add(amount)
            .ok_or(DaxError::ArithmeticOverflow)?;
        self.accounts.insert((user, symbol), account);
        self.escrowed.insert(symbol, escrowed);
        Ok(account)
    }

    /// Withdraw from the available balance.
    ///
    /// # Errors
    /// - `InvalidQuantity` if `amount <= 0`
    /// - `InsufficientBalance` if available < amount
    pub fn withdraw(&mut self, user: UserId, symbol: Symbol, amount: Decimal) -> Result<EscrowAccount> {
        ensure_positive(amount)?;
        let account = self.account_mut(user, symbol, amount)?;
        if account.available < amount {
            return Err(DaxError::InsufficientBalance {
                symbol,
                needed: amount,
                available: account.available,
            });
        }
        account.available -= amount;
        let account = *account;
        if let Some(escrowed) = self.escrowed.get_mut(&symbol) {
            *escrowed -= amount;
        }
        Ok(account)
    }

    /// Commit funds behind a resting order (available → committed).
    ///
    /// # Errors
    /// - `InsufficientBalance` if available < amount
    /// - `ArithmeticOverflow` if the committed balance would not fit
    pub fn commit(&mut self, user: UserId, symbol: Symbol, amount: Decimal) -> Result<()> {
        let account = self.account_mut(user, symbol, amount)?;
        if account.available < amount {
            return Err(DaxError::InsufficientBalance {
                symbol,
                needed: amount,
                available: account.available,
            });
        }
        let committed = account
            .committed
            .checked_add(amount)
            .ok_or(DaxError::ArithmeticOverflow)?;
        account.available -= amount;
        account.committed = committed;
        Ok(())
    }

    /// Release committed funds (committed → available), e.g. on cancel.
    ///
    /// # Errors
    /// - `InsufficientBalance` if committed < amount
    /// - `ArithmeticOverflow` if the available balance would not fit
    pub fn release(&mut self, user: UserId, symbol: Symbol, amount: Decimal) -> Result<()> {
        let account = self.account_mut(user, symbol, amount)?;
        if account.committed < amount {
            return Err(DaxError::InsufficientBalance {
                symbol,
                needed: amount,
                available: account.committed,
            });
        }
        let available = account
            .available
            .checked_add(amount)
            .ok_or(DaxError::ArithmeticOverflow)?;
        account.committed -= amount;
        account.available = available;
        Ok(())
    }

    /// Move `amount` of available balance from one user to another.
    pub fn transfer(&mut self, from: UserId, to: UserId, symbol: Symbol, amount: Decimal) -> Result<()> {
        self.apply_transfers(&[Transfer::available(from, to, symbol, amount)])
    }

    /// Apply every leg or none of them.
    ///
    /// Legs are applied in order to a staged copy of the touched accounts;
    /// the ledger is only written once all of them succeed.
    ///
    /// # Errors
    /// - `InvalidQuantity` if a leg's amount is not positive
    /// - `InsufficientBalance` if a sender's source balance would go negative
    /// - `ArithmeticOverflow` if a credit overflows
    pub fn apply_transfers(&mut self, legs: &[Transfer]) -> Result<()> {
        let mut staged: HashMap<(UserId, Symbol), EscrowAccount> = HashMap::new();

        for leg in legs {
            ensure_positive(leg.amount)?;

            let from_key = (leg.from, leg.symbol);
            let mut sender = *staged
                .entry(from_key)
                .or_insert_with(|| self.balance(leg.from, leg.symbol));
            let source = match leg.source {
                BalanceSource::Available => &mut sender.available,
                BalanceSource::Committed => &mut sender.committed,
            };
            if *source < leg.amount {
                return Err(DaxError::InsufficientBalance {
                    symbol: leg.symbol,
                    needed: leg.amount,
                    available: *source,
                });
            }
            *source -= leg.amount;
            staged.insert(from_key, sender);

            let receiver = staged
                .entry((leg.to, leg.symbol))
                .or_insert_with(|| self.balance(leg.to, leg.symbol));
            receiver.available = receiver
                .available
                .checked_add(leg.amount)
                .ok_or(DaxError::ArithmeticOverflow)?;
        }

        self.accounts.extend(staged);
        Ok(())
    }

    fn account_mut(
        &mut self,
        user: UserId,
        symbol: Symbol,
        needed: Decimal,
    ) -> Result<&mut EscrowAccount> {
        self.accounts
            .get_mut(&(user, symbol))
            .ok_or(DaxError::InsufficientBalance {
                symbol,
                needed,
                available: Decimal::ZERO,
            })
    }

    /// Balance for a (user, symbol); zero if the account does not exist.
    #[must_use]
    pub fn balance(&self, user: UserId, symbol: Symbol) -> EscrowAccount {
        self.accounts
            .get(&(user, symbol))
            .copied()
            .unwrap_or_default()
    }

    /// Every account held by `user`, ordered by symbol.
    #[must_use]
    pub fn balances_of(&self, user: UserId) -> Vec<(Symbol, EscrowAccount)> {
        let mut out: Vec<(Symbol, EscrowAccount)> = self
            .accounts
            .iter()
            .filter(|((u, _), _)| *u == user)
            .map(|((_, s), account)| (*s, *account))
            .collect();
        out.sort_by_key(|(s, _)| *s);
        out
    }

    /// Total escrowed supply of a symbol (sum of all users' available + committed).
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the sum does not fit, which only a
    /// corrupted ledger can produce.
    pub fn total_supply(&self, symbol: Symbol) -> Result<Decimal> {
        self.accounts
            .iter()
            .filter(|((_, s), _)| *s == symbol)
            .try_fold(Decimal::ZERO, |sum, (_, account)| {
                sum.checked_add(account.checked_total()?)
            })
            .ok_or(DaxError::ArithmeticOverflow)
    }

    /// Running escrowed total of a symbol, maintained by deposits and
    /// withdrawals.
    #[must_use]
    pub fn escrowed_supply(&self, symbol: Symbol) -> Decimal {
        self.escrowed.get(&symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether any account holds a negative balance. Never true unless the
    /// ledger has been corrupted.
    #[must_use]
    pub fn has_negative_balance(&self) -> bool {
        self.accounts
            .values()
            .any(|a| a.available.is_sign_negative() || a.committed.is_sign_negative())
    }
}

#[cfg(test)]
mod tests {
    use dax_types::TokenAddress;

    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn setup() -> (EscrowLedger, TokenRegistry) {
        let mut reg = TokenRegistry::new();
        reg.whitelist(
            sym("TOKEN"),
            TokenAddress::from_bytes([1; 20]),
            &[sym("HYDRO")],
            &[TokenAddress::from_bytes([3; 20])],
        )
        .unwrap();
        (EscrowLedger::new(), reg)
    }

    #[test]
    fn deposit_increases_available() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        let account = ledger.deposit(&reg, user, sym("TOKEN"), Decimal::new(100, 0)).unwrap();
        assert_eq!(account.available, Decimal::new(100, 0));
        assert_eq!(account.committed, Decimal::ZERO);
        assert_eq!(ledger.balance(user, sym("TOKEN")), account);
    }

    #[test]
    fn deposit_rejects_unlisted_and_non_positive() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        assert!(matches!(
            ledger.deposit(&reg, user, sym("BAT"), Decimal::ONE),
            Err(DaxError::NotWhitelisted(_))
        ));
        assert!(matches!(
            ledger.deposit(&reg, user, sym("TOKEN"), Decimal::ZERO),
            Err(DaxError::InvalidQuantity(_))
        ));
        assert!(ledger.balances_of(user).is_empty());
    }

    #[test]
    fn withdraw_round_trip_keeps_zero_record() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("TOKEN"), Decimal::new(100, 0)).unwrap();
        let account = ledger.withdraw(user, sym("TOKEN"), Decimal::new(100, 0)).unwrap();
        assert!(account.is_zero());
        assert_eq!(ledger.balances_of(user).len(), 1);
    }

    #[test]
    fn over_withdrawal_fails_unchanged() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("TOKEN"), Decimal::new(100, 0)).unwrap();
        let err = ledger.withdraw(user, sym("TOKEN"), Decimal::new(101, 0)).unwrap_err();
        assert!(matches!(err, DaxError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance(user, sym("TOKEN")).available, Decimal::new(100, 0));
    }

    #[test]
    fn committed_funds_cannot_be_withdrawn() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("TOKEN"), Decimal::new(100, 0)).unwrap();
        ledger.commit(user, sym("TOKEN"), Decimal::new(80, 0)).unwrap();
        assert!(ledger.withdraw(user, sym("TOKEN"), Decimal::new(30, 0)).is_err());
        ledger.withdraw(user, sym("TOKEN"), Decimal::new(20, 0)).unwrap();
        let account = ledger.balance(user, sym("TOKEN"));
        assert_eq!(account.available, Decimal::ZERO);
        assert_eq!(account.committed, Decimal::new(80, 0));
    }

    #[test]
    fn release_restores_available() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("HYDRO"), Decimal::new(4000, 0)).unwrap();
        ledger.commit(user, sym("HYDRO"), Decimal::new(4000, 0)).unwrap();
        ledger.release(user, sym("HYDRO"), Decimal::new(4000, 0)).unwrap();
        let account = ledger.balance(user, sym("HYDRO"));
        assert_eq!(account.available, Decimal::new(4000, 0));
        assert_eq!(account.committed, Decimal::ZERO);
        assert!(ledger.release(user, sym("HYDRO"), Decimal::ONE).is_err());
    }

    #[test]
    fn transfer_moves_available() {
        let (mut ledger, reg) = setup();
        let (a, b) = (UserId::new(), UserId::new());
        ledger.deposit(&reg, a, sym("TOKEN"), Decimal::new(10, 0)).unwrap();
        ledger.transfer(a, b, sym("TOKEN"), Decimal::new(4, 0)).unwrap();
        assert_eq!(ledger.balance(a, sym("TOKEN")).available, Decimal::new(6, 0));
        assert_eq!(ledger.balance(b, sym("TOKEN")).available, Decimal::new(4, 0));
    }

    #[test]
    fn failing_leg_rolls_back_whole_batch() {
        let (mut ledger, reg) = setup();
        let (maker, taker) = (UserId::new(), UserId::new());
        ledger.deposit(&reg, maker, sym("TOKEN"), Decimal::new(500, 0)).unwrap();
        ledger.commit(maker, sym("TOKEN"), Decimal::new(500, 0)).unwrap();
        ledger.deposit(&reg, taker, sym("HYDRO"), Decimal::new(500, 0)).unwrap();

        let err = ledger
            .apply_transfers(&[
                Transfer::committed(maker, taker, sym("TOKEN"), Decimal::new(100, 0)),
                Transfer::available(taker, maker, sym("HYDRO"), Decimal::new(1000, 0)),
            ])
            .unwrap_err();
        assert!(matches!(err, DaxError::InsufficientBalance { .. }));

        assert_eq!(ledger.balance(maker, sym("TOKEN")).committed, Decimal::new(500, 0));
        assert!(ledger.balance(taker, sym("TOKEN")).is_zero());
        assert_eq!(ledger.balance(taker, sym("HYDRO")).available, Decimal::new(500, 0));
    }

    #[test]
    fn fill_legs_apply_together() {
        let (mut ledger, reg) = setup();
        let (maker, taker) = (UserId::new(), UserId::new());
        ledger.deposit(&reg, maker, sym("TOKEN"), Decimal::new(500, 0)).unwrap();
        ledger.commit(maker, sym("TOKEN"), Decimal::new(500, 0)).unwrap();
        ledger.deposit(&reg, taker, sym("HYDRO"), Decimal::new(1000, 0)).unwrap();

        ledger
            .apply_transfers(&[
                Transfer::committed(maker, taker, sym("TOKEN"), Decimal::new(100, 0)),
                Transfer::available(taker, maker, sym("HYDRO"), Decimal::new(1000, 0)),
            ])
            .unwrap();

        assert_eq!(ledger.balance(maker, sym("TOKEN")).committed, Decimal::new(400, 0));
        assert_eq!(ledger.balance(maker, sym("HYDRO")).available, Decimal::new(1000, 0));
        assert_eq!(ledger.balance(taker, sym("TOKEN")).available, Decimal::new(100, 0));
        assert_eq!(ledger.balance(taker, sym("HYDRO")).available, Decimal::ZERO);
        assert_eq!(ledger.total_supply(sym("TOKEN")).unwrap(), Decimal::new(500, 0));
        assert_eq!(ledger.total_supply(sym("HYDRO")).unwrap(), Decimal::new(1000, 0));
    }

    #[test]
    fn self_transfer_is_neutral() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("TOKEN"), Decimal::new(10, 0)).unwrap();
        ledger.commit(user, sym("TOKEN"), Decimal::new(10, 0)).unwrap();
        ledger
            .apply_transfers(&[Transfer::committed(user, user, sym("TOKEN"), Decimal::new(10, 0))])
            .unwrap();
        let account = ledger.balance(user, sym("TOKEN"));
        assert_eq!(account.available, Decimal::new(10, 0));
        assert_eq!(account.committed, Decimal::ZERO);
    }

    #[test]
    fn total_supply_sums_all_users() {
        let (mut ledger, reg) = setup();
        let (u1, u2) = (UserId::new(), UserId::new());
        ledger.deposit(&reg, u1, sym("HYDRO"), Decimal::new(1000, 0)).unwrap();
        ledger.deposit(&reg, u2, sym("HYDRO"), Decimal::new(500, 0)).unwrap();
        ledger.commit(u1, sym("HYDRO"), Decimal::new(300, 0)).unwrap();
        assert_eq!(ledger.total_supply(sym("HYDRO")).unwrap(), Decimal::new(1500, 0));
        assert_eq!(ledger.escrowed_supply(sym("HYDRO")), Decimal::new(1500, 0));
        ledger.withdraw(u2, sym("HYDRO"), Decimal::new(500, 0)).unwrap();
        assert_eq!(ledger.escrowed_supply(sym("HYDRO")), Decimal::new(1000, 0));
        assert!(!ledger.has_negative_balance());
    }

    #[test]
    fn deposit_past_max_fails_unchanged() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("TOKEN"), Decimal::MAX).unwrap();
        assert!(matches!(
            ledger.deposit(&reg, user, sym("TOKEN"), Decimal::MAX),
            Err(DaxError::ArithmeticOverflow)
        ));
        assert_eq!(ledger.balance(user, sym("TOKEN")).available, Decimal::MAX);
        assert_eq!(ledger.total_supply(sym("TOKEN")).unwrap(), Decimal::MAX);
    }

    #[test]
    fn symbol_total_is_capped_across_users() {
        let (mut ledger, reg) = setup();
        let (u1, u2) = (UserId::new(), UserId::new());
        ledger.deposit(&reg, u1, sym("HYDRO"), Decimal::MAX).unwrap();
        assert!(matches!(
            ledger.deposit(&reg, u2, sym("HYDRO"), Decimal::MAX),
            Err(DaxError::ArithmeticOverflow)
        ));
        assert!(ledger.balances_of(u2).is_empty());
        assert_eq!(ledger.total_supply(sym("HYDRO")).unwrap(), Decimal::MAX);

        ledger.withdraw(u1, sym("HYDRO"), Decimal::MAX).unwrap();
        ledger.deposit(&reg, u2, sym("HYDRO"), Decimal::MAX).unwrap();
        assert_eq!(ledger.total_supply(sym("HYDRO")).unwrap(), Decimal::MAX);
    }

    #[test]
    fn commit_at_max_then_redeposit_is_rejected() {
        let (mut ledger, reg) = setup();
        let user = UserId::new();
        ledger.deposit(&reg, user, sym("TOKEN"), Decimal::MAX).unwrap();
        ledger.commit(user, sym("TOKEN"), Decimal::MAX).unwrap();
        assert!(matches!(
            ledger.deposit(&reg, user, sym("TOKEN"), Decimal::MAX),
            Err(DaxError::ArithmeticOverflow)
        ));
        let account = ledger.balance(user, sym("TOKEN"));
        assert_eq!(account.available, Decimal::ZERO);
        assert_eq!(account.committed, Decimal::MAX);

        ledger.release(user, sym("TOKEN"), Decimal::MAX).unwrap();
        assert_eq!(ledger.balance(user, sym("TOKEN")).available, Decimal::MAX);
    }
}
