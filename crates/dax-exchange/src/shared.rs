//! Thread-safe handle around an [`Exchange`].
//!
//! Every mutating call holds the write lock for its whole duration, so
//! deposits, withdrawals, fills and cancellations are serialized and never
//! interleave their ledger updates. Queries take the read lock and return
//! owned snapshots.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dax_matchcore::{MarketOrderReport, OrderLength};
use dax_types::{
    DaxError, EscrowAccount, ExchangeEvent, Order, OrderId, OrderSide, Result, Symbol,
    TokenAddress, TradingPair, UserId,
};
use rust_decimal::Decimal;

use crate::Exchange;

#[derive(Debug, Clone)]
pub struct SharedExchange {
    inner: Arc<RwLock<Exchange>>,
}

impl SharedExchange {
    #[must_use]
    pub fn new(exchange: Exchange) -> Self {
        Self {
            inner: Arc::new(RwLock::new(exchange)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Exchange>> {
        self.inner
            .read()
            .map_err(|_| DaxError::Internal("exchange lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Exchange>> {
        self.inner
            .write()
            .map_err(|_| DaxError::Internal("exchange lock poisoned".into()))
    }

    /// Run `f` against a consistent snapshot.
    pub fn with_read<R>(&self, f: impl FnOnce(&Exchange) -> R) -> Result<R> {
        Ok(f(&*self.read()?))
    }

    /// Run `f` as one serialized transaction.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Exchange) -> Result<R>) -> Result<R> {
        f(&mut *self.write()?)
    }

    pub fn whitelist(
        &self,
        caller: UserId,
        symbol: Symbol,
        token: TokenAddress,
        pair_symbols: &[Symbol],
        pair_refs: &[TokenAddress],
    ) -> Result<Vec<Symbol>> {
        self.with_write(|ex| {
            ex.whitelist(caller, symbol, token, pair_symbols, pair_refs)
                .map(|entry| entry.pairs)
        })
    }

    pub fn is_whitelisted(&self, symbol: Symbol) -> Result<bool> {
        self.with_read(|ex| ex.is_whitelisted(&symbol))
    }

    pub fn is_address_whitelisted(&self, token: TokenAddress) -> Result<bool> {
        self.with_read(|ex| ex.is_address_whitelisted(&token))
    }

    pub fn get_pairs(&self, symbol: Symbol) -> Result<Vec<Symbol>> {
        self.with_read(|ex| ex.get_pairs(&symbol).to_vec())
    }

    pub fn deposit(&self, caller: UserId, symbol: Symbol, amount: Decimal) -> Result<EscrowAccount> {
        self.with_write(|ex| ex.deposit(caller, symbol, amount))
    }

    pub fn deposit_token(
        &self,
        caller: UserId,
        token: TokenAddress,
        amount: Decimal,
    ) -> Result<EscrowAccount> {
        self.with_write(|ex| ex.deposit_token(caller, token, amount))
    }

    pub fn withdraw(&self, caller: UserId, symbol: Symbol, amount: Decimal) -> Result<EscrowAccount> {
        self.with_write(|ex| ex.withdraw(caller, symbol, amount))
    }

    pub fn limit_order(
        &self,
        caller: UserId,
        side: OrderSide,
        pair: TradingPair,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order> {
        self.with_write(|ex| ex.limit_order(caller, side, pair.first, pair.second, quantity, price))
    }

    pub fn market_order(
        &self,
        caller: UserId,
        side: OrderSide,
        pair: TradingPair,
        quantity: Decimal,
    ) -> Result<MarketOrderReport> {
        self.with_write(|ex| ex.market_order(caller, side, pair.first, pair.second, quantity))
    }

    pub fn cancel_order(&self, caller: UserId, order_id: OrderId) -> Result<Order> {
        self.with_write(|ex| ex.cancel_order(caller, order_id))
    }

    pub fn take_events(&self) -> Result<Vec<ExchangeEvent>> {
        self.with_write(|ex| Ok(ex.take_events()))
    }

    pub fn get_escrow_balance(&self, user: UserId, symbol: Symbol) -> Result<EscrowAccount> {
        self.with_read(|ex| ex.get_escrow_balance(user, symbol))
    }

    pub fn balances_of(&self, user: UserId) -> Result<Vec<(Symbol, EscrowAccount)>> {
        self.with_read(|ex| ex.balances_of(user))
    }

    pub fn get_order(&self, pair: TradingPair, order_id: OrderId) -> Result<Option<Order>> {
        self.with_read(|ex| ex.get_order(&pair, order_id).cloned())
    }

    pub fn get_order_length(&self, pair: TradingPair) -> Result<OrderLength> {
        self.with_read(|ex| ex.get_order_length(&pair))
    }

    pub fn list_orders(&self, pair: TradingPair, side: OrderSide) -> Result<Vec<Order>> {
        self.with_read(|ex| ex.list_orders(&pair, side).into_iter().cloned().collect())
    }

    /// Closed orders of `pair`, newest first.
    pub fn list_closed_orders(&self, pair: TradingPair, limit: Option<usize>) -> Result<Vec<Order>> {
        self.with_read(|ex| {
            ex.list_closed_orders(&pair, limit)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn last_order_id(&self) -> Result<OrderId> {
        self.with_read(Exchange::last_order_id)
    }

    pub fn verify_supply(&self, symbol: Symbol) -> Result<()> {
        self.with_read(|ex| ex.verify_supply(symbol))?
    }

    pub fn verify_all_supply(&self) -> Result<()> {
        self.with_read(Exchange::verify_all_supply)?
    }
}
