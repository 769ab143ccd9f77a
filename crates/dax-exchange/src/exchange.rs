//! The exchange facade.
//!
//! Owns the registry, the escrow ledger, the matching engine and the
//! supply tracker, and is the only place events are produced. Every
//! request is validated in full before the first mutation, except the
//! market-order walk, where each fill stands on its own.

use dax_ledger::{EscrowLedger, SupplyConservation, TokenEntry, TokenRegistry};
use dax_matchcore::{MarketOrderReport, MatchingEngine, OrderLength};
use dax_types::{
    DaxError, EscrowAccount, ExchangeConfig, ExchangeEvent, Order, OrderId, OrderSide, Result,
    Symbol, TokenAddress, TradingPair, UserId,
};
use rust_decimal::Decimal;

pub struct Exchange {
    config: ExchangeConfig,
    registry: TokenRegistry,
    ledger: EscrowLedger,
    engine: MatchingEngine,
    supply: SupplyConservation,
    events: Vec<ExchangeEvent>,
}

impl Exchange {
    /// Create an empty exchange administered by `config.admin`.
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        let engine = MatchingEngine::new(&config);
        tracing::info!(
            admin = %config.admin,
            max_open_orders = config.max_open_orders_per_user,
            prevent_self_trade = config.prevent_self_trade,
            "Exchange initialized"
        );
        Ok(Self {
            config,
            registry: TokenRegistry::new(),
            ledger: EscrowLedger::new(),
            engine,
            supply: SupplyConservation::new(),
            events: Vec::new(),
        })
    }

    fn emit(&mut self, event: ExchangeEvent) {
        tracing::debug!(event = event.name(), "Event emitted");
        self.events.push(event);
    }

    #[must_use]
    pub fn admin(&self) -> UserId {
        self.config.admin
    }

    #[must_use]
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    // =================================================================
    // Registry
    // =================================================================

    /// Whitelist a token and the counter-tokens it may trade against.
    ///
    /// # Errors
    /// `Unauthorized` unless `caller` is the admin, otherwise whatever
    /// [`TokenRegistry::whitelist`] rejects.
    pub fn whitelist(
        &mut self,
        caller: UserId,
        symbol: Symbol,
        token: TokenAddress,
        pair_symbols: &[Symbol],
        pair_refs: &[TokenAddress],
    ) -> Result<TokenEntry> {
        if caller != self.config.admin {
            tracing::warn!(caller = %caller, symbol = %symbol, "Whitelist rejected: not admin");
            return Err(DaxError::Unauthorized { caller });
        }
        let entry = self
            .registry
            .whitelist(symbol, token, pair_symbols, pair_refs)?
            .clone();
        tracing::info!(
            symbol = %symbol,
            token = %token,
            pairs = ?entry.pairs,
            "Token whitelisted"
        );
        self.emit(ExchangeEvent::TokenWhitelisted {
            symbol,
            token,
            pairs: entry.pairs.clone(),
        });
        Ok(entry)
    }

    #[must_use]
    pub fn is_whitelisted(&self, symbol: &Symbol) -> bool {
        self.registry.is_whitelisted(symbol)
    }

    #[must_use]
    pub fn is_address_whitelisted(&self, token: &TokenAddress) -> bool {
        self.registry.is_address_whitelisted(token)
    }

    #[must_use]
    pub fn get_pairs(&self, symbol: &Symbol) -> &[Symbol] {
        self.registry.get_pairs(symbol)
    }

    #[must_use]
    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    // =================================================================
    // Escrow
    // =================================================================

    /// Credit a deposit whose external transfer into custody has already
    /// succeeded.
    ///
    /// Fails with `ArithmeticOverflow`, leaving every balance unchanged, if
    /// the symbol's escrowed total would exceed `Decimal::MAX`.
    pub fn deposit(&mut self, caller: UserId, symbol: Symbol, amount: Decimal) -> Result<EscrowAccount> {
        if amount > Decimal::ZERO {
            self.supply.check_deposit(symbol, amount)?;
        }
        let account = self.ledger.deposit(&self.registry, caller, symbol, amount)?;
        self.supply.record_deposit(symbol, amount)?;
        tracing::info!(
            user = %caller,
            symbol = %symbol,
            amount = %amount,
            available = %account.available,
            "Deposit credited"
        );
        self.emit(ExchangeEvent::Deposited {
            user: caller,
            symbol,
            amount,
            account,
        });
        Ok(account)
    }

    /// Deposit identified by the token reference instead of the symbol.
    pub fn deposit_token(
        &mut self,
        caller: UserId,
        token: TokenAddress,
        amount: Decimal,
    ) -> Result<EscrowAccount> {
        let symbol = self
            .registry
            .symbol_of(&token)
            .ok_or(DaxError::UnknownToken(token))?;
        self.deposit(caller, symbol, amount)
    }

    /// Withdraw from the caller's available balance. Committed funds stay
    /// behind their orders.
    pub fn withdraw(&mut self, caller: UserId, symbol: Symbol, amount: Decimal) -> Result<EscrowAccount> {
        let account = match self.ledger.withdraw(caller, symbol, amount) {
            Ok(account) => account,
            Err(err) => {
                tracing::warn!(user = %caller, symbol = %symbol, amount = %amount, error = %err, "Withdrawal rejected");
                return Err(err);
            }
        };
        self.supply.record_withdrawal(symbol, amount)?;
        tracing::info!(
            user = %caller,
            symbol = %symbol,
            amount = %amount,
            available = %account.available,
            "Withdrawal debited"
        );
        self.emit(ExchangeEvent::Withdrawn {
            user: caller,
            symbol,
            amount,
            account,
        });
        Ok(account)
    }

    #[must_use]
    pub fn get_escrow_balance(&self, user: UserId, symbol: Symbol) -> EscrowAccount {
        self.ledger.balance(user, symbol)
    }

    #[must_use]
    pub fn balances_of(&self, user: UserId) -> Vec<(Symbol, EscrowAccount)> {
        self.ledger.balances_of(user)
    }

    // =================================================================
    // Orders
    // =================================================================

    /// Place a resting limit order. It is not matched on submission.
    pub fn limit_order(
        &mut self,
        caller: UserId,
        side: OrderSide,
        first: Symbol,
        second: Symbol,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order> {
        let pair = TradingPair::new(first, second);
        let order = self
            .engine
            .limit_order(
                &self.registry,
                &mut self.ledger,
                caller,
                side,
                pair,
                quantity,
                price,
            )
            .inspect_err(|err| {
                tracing::warn!(user = %caller, pair = %pair, side = %side, error = %err, "Limit order rejected");
            })?;
        self.emit(ExchangeEvent::OrderOpened {
            order: order.clone(),
        });
        Ok(order)
    }

    /// Execute a market order against the resting orders of the pair.
    ///
    /// # Errors
    /// Besides input validation, fails with `SupplyInvariantViolation` if
    /// the walk left either pair symbol unbalanced.
    pub fn market_order(
        &mut self,
        caller: UserId,
        side: OrderSide,
        first: Symbol,
        second: Symbol,
        quantity: Decimal,
    ) -> Result<MarketOrderReport> {
        let pair = TradingPair::new(first, second);
        let report = self
            .engine
            .market_order(&self.registry, &mut self.ledger, caller, side, pair, quantity)
            .inspect_err(|err| {
                tracing::warn!(user = %caller, pair = %pair, side = %side, error = %err, "Market order rejected");
            })?;

        let mut events = Vec::with_capacity(report.fills.len() + 1);
        for (fill, maker) in report.fills.iter().zip(&report.makers) {
            if maker.is_active() {
                events.push(ExchangeEvent::OrderPartiallyFilled {
                    order: maker.clone(),
                    fill: fill.clone(),
                });
            } else {
                events.push(ExchangeEvent::OrderClosed {
                    order: maker.clone(),
                });
            }
        }
        if !report.fills.is_empty() {
            events.push(ExchangeEvent::OrderClosed {
                order: report.order.clone(),
            });
        }
        for event in events {
            self.emit(event);
        }

        for symbol in [first, second] {
            self.verify_supply(symbol)?;
        }
        Ok(report)
    }

    /// Cancel the caller's own resting order.
    pub fn cancel_order(&mut self, caller: UserId, order_id: OrderId) -> Result<Order> {
        let order = self
            .engine
            .cancel_order(&mut self.ledger, caller, order_id)
            .inspect_err(|err| {
                tracing::warn!(user = %caller, order = %order_id, error = %err, "Cancel rejected");
            })?;
        self.emit(ExchangeEvent::OrderClosed {
            order: order.clone(),
        });
        Ok(order)
    }

    #[must_use]
    pub fn get_order(&self, pair: &TradingPair, order_id: OrderId) -> Option<&Order> {
        self.engine.get_order(pair, order_id)
    }

    #[must_use]
    pub fn get_order_length(&self, pair: &TradingPair) -> OrderLength {
        self.engine.order_length(pair)
    }

    #[must_use]
    pub fn list_orders(&self, pair: &TradingPair, side: OrderSide) -> Vec<&Order> {
        self.engine.list_orders(pair, side)
    }

    /// Closed orders, most recent first. `None` uses the configured default
    /// listing size.
    #[must_use]
    pub fn list_closed_orders(&self, pair: &TradingPair, limit: Option<usize>) -> Vec<&Order> {
        self.engine
            .list_closed(pair, limit.unwrap_or(self.config.history_limit_default))
    }

    #[must_use]
    pub fn last_order_id(&self) -> OrderId {
        self.engine.last_order_id()
    }

    // =================================================================
    // Events and invariants
    // =================================================================

    /// Drain the events produced since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn verify_supply(&self, symbol: Symbol) -> Result<()> {
        let actual = self.ledger.total_supply(symbol)?;
        self.supply.verify(symbol, actual).inspect_err(|err| {
            tracing::error!(symbol = %symbol, error = %err, "Supply conservation violated");
        })
    }

    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply.verify_ledger(&self.ledger).inspect_err(|err| {
            tracing::error!(error = %err, "Supply conservation violated");
        })
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("admin", &self.config.admin)
            .field("tokens", &self.registry.len())
            .field("last_order_id", &self.engine.last_order_id())
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}
