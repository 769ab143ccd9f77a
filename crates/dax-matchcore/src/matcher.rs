//! Limit-order admission and market-order matching.
//!
//! ```text
//! limit_order:  validate -> commit escrow -> rest (no matching)
//! market_order: walk the opposite side oldest-first -> one atomic fill per resting order
//! ```
//!
//! ## Fill legs
//!
//! | Resting | Maker pays (from committed) | Taker pays (from available) |
//! |---|---|---|
//! | SELL | `fill` of first | `fill × price` of second |
//! | BUY | `fill × price` of second | `fill` of first |
//!
//! A fill whose legs cannot be paid is skipped; fills already applied by
//! the same walk stay applied.

use std::collections::HashMap;

use chrono::Utc;
use dax_ledger::{EscrowLedger, TokenRegistry, Transfer};
use dax_types::{
    CloseReason, DaxError, ExchangeConfig, Fill, FillId, Order, OrderId, OrderSide, Result,
    TradingPair, UserId,
};
use rust_decimal::Decimal;

use crate::{OrderBook, OrderHistory, determinism::compute_fill_root};

/// Order counts for one pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderLength {
    pub buy: usize,
    pub sell: usize,
    pub closed: usize,
}

/// Outcome of one market order.
#[derive(Debug, Clone)]
pub struct MarketOrderReport {
    /// The market order, closed with [`CloseReason::Executed`]. `quantity`
    /// holds the unfilled remainder.
    pub order: Order,
    pub fills: Vec<Fill>,
    /// Each maker right after its fill, parallel to `fills`.
    pub makers: Vec<Order>,
    /// Resting orders passed over without a fill.
    pub skipped: Vec<OrderId>,
    pub fill_root: [u8; 32],
}

impl MarketOrderReport {
    #[must_use]
    pub fn filled_quantity(&self) -> Decimal {
        self.order.filled_qty()
    }

    #[must_use]
    pub fn unfilled_quantity(&self) -> Decimal {
        self.order.quantity
    }

    #[must_use]
    pub fn is_fully_filled(&self) -> bool {
        self.order.quantity.is_zero()
    }
}

/// Owns every order book, the closed-order history and the order id
/// counter.
#[derive(Debug)]
pub struct MatchingEngine {
    books: HashMap<TradingPair, OrderBook>,
    history: OrderHistory,
    /// Resting order -> pair.
    open_orders: HashMap<OrderId, TradingPair>,
    open_per_user: HashMap<UserId, usize>,
    last_order_id: OrderId,
    max_open_orders_per_user: usize,
    prevent_self_trade: bool,
}

impl MatchingEngine {
    #[must_use]
    pub fn new(config: &ExchangeConfig) -> Self {
        Self {
            books: HashMap::new(),
            history: OrderHistory::new(),
            open_orders: HashMap::new(),
            open_per_user: HashMap::new(),
            last_order_id: OrderId(0),
            max_open_orders_per_user: config.max_open_orders_per_user,
            prevent_self_trade: config.prevent_self_trade,
        }
    }

    fn allocate_order_id(&mut self) -> OrderId {
        self.last_order_id = self.last_order_id.next();
        self.last_order_id
    }

    fn release_slot(open_per_user: &mut HashMap<UserId, usize>, owner: UserId) {
        if let Some(count) = open_per_user.get_mut(&owner) {
            *count = count.saturating_sub(1);
        }
    }

    /// Validate, commit escrow, and rest a limit order.
    ///
    /// Nothing is mutated (and no id is consumed) unless the order rests.
    ///
    /// # Errors
    /// - `InvalidQuantity` / `InvalidPrice` for non-positive input
    /// - `NotWhitelisted` / `InvalidPair` if the pair may not trade
    /// - `OrderLimitExceeded` if the owner is at the open-order cap
    /// - `InsufficientBalance` if the required escrow is not available
    #[allow(clippy::too_many_arguments)]
    pub fn limit_order(
        &mut self,
        registry: &TokenRegistry,
        ledger: &mut EscrowLedger,
        owner: UserId,
        side: OrderSide,
        pair: TradingPair,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order> {
        if quantity <= Decimal::ZERO {
            return Err(DaxError::InvalidQuantity(quantity));
        }
        if price <= Decimal::ZERO {
            return Err(DaxError::InvalidPrice(price));
        }
        registry.ensure_pair(&pair.first, &pair.second)?;

        let open = self.open_per_user.get(&owner).copied().unwrap_or(0);
        if open >= self.max_open_orders_per_user {
            return Err(DaxError::OrderLimitExceeded {
                limit: self.max_open_orders_per_user,
            });
        }

        let order = Order::limit(self.last_order_id.next(), owner, pair, side, quantity, price);
        let (symbol, amount) = order.required_escrow()?;
        ledger.commit(owner, symbol, amount)?;

        let book = self
            .books
            .entry(pair)
            .or_insert_with(|| OrderBook::new(pair));
        if let Err(err) = book.insert(order.clone()) {
            ledger.release(owner, symbol, amount)?;
            return Err(err);
        }

        self.last_order_id = order.id;
        self.open_orders.insert(order.id, pair);
        *self.open_per_user.entry(owner).or_insert(0) += 1;

        tracing::info!(
            order = %order.id,
            owner = %owner,
            pair = %pair,
            side = %side,
            qty = %quantity,
            price = %price,
            committed = %amount,
            "Limit order resting"
        );
        Ok(order)
    }

    /// Execute a market order against the opposite side of `pair`.
    ///
    /// Resting orders are visited oldest-first. The market order never
    /// rests; whatever is not filled when the side is exhausted is dropped.
    ///
    /// # Errors
    /// - `InvalidQuantity` for non-positive input
    /// - `NotWhitelisted` / `InvalidPair` if the pair may not trade
    #[allow(clippy::too_many_lines)]
    pub fn market_order(
        &mut self,
        registry: &TokenRegistry,
        ledger: &mut EscrowLedger,
        taker: UserId,
        side: OrderSide,
        pair: TradingPair,
        quantity: Decimal,
    ) -> Result<MarketOrderReport> {
        if quantity <= Decimal::ZERO {
            return Err(DaxError::InvalidQuantity(quantity));
        }
        registry.ensure_pair(&pair.first, &pair.second)?;

        let id = self.allocate_order_id();
        let mut order = Order::market(id, taker, pair, side, quantity);
        let mut fills: Vec<Fill> = Vec::new();
        let mut makers: Vec<Order> = Vec::new();
        let mut skipped: Vec<OrderId> = Vec::new();
        let mut fill_seq: u32 = 0;

        let candidates = self
            .books
            .get(&pair)
            .map(|book| book.order_ids(side.opposite()))
            .unwrap_or_default();

        for maker_id in candidates {
            if order.quantity.is_zero() {
                break;
            }
            let Some(book) = self.books.get_mut(&pair) else {
                break;
            };
            let Some(resting) = book.get(maker_id) else {
                continue;
            };
            if resting.quantity <= Decimal::ZERO {
                continue;
            }
            let maker = resting.owner;
            if self.prevent_self_trade && maker == taker {
                tracing::warn!(
                    user = %taker,
                    taker_order = %id,
                    maker_order = %maker_id,
                    "Self-trade blocked: resting order skipped"
                );
                skipped.push(maker_id);
                continue;
            }

            let fill_qty = order.quantity.min(resting.quantity);
            let price = resting.price.unwrap_or(Decimal::ZERO);
            let legs = resting.quote_for(fill_qty).map(|quote| {
                let legs = match resting.side {
                    OrderSide::Sell => [
                        Transfer::committed(maker, taker, pair.first, fill_qty),
                        Transfer::available(taker, maker, pair.second, quote),
                    ],
                    OrderSide::Buy => [
                        Transfer::committed(maker, taker, pair.second, quote),
                        Transfer::available(taker, maker, pair.first, fill_qty),
                    ],
                };
                (quote, legs)
            });

            let quote = match legs.and_then(|(quote, legs)| {
                ledger.apply_transfers(&legs)?;
                Ok(quote)
            }) {
                Ok(quote) => quote,
                Err(err @ (DaxError::InsufficientBalance { .. } | DaxError::ArithmeticOverflow)) => {
                    tracing::warn!(
                        taker_order = %id,
                        maker_order = %maker_id,
                        error = %err,
                        "Fill failed: resting order skipped"
                    );
                    skipped.push(maker_id);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let resting = book
                .get_mut(maker_id)
                .ok_or(DaxError::OrderNotFound(maker_id))?;
            resting.apply_fill(fill_qty);
            let snapshot = resting.clone();
            order.apply_fill(fill_qty);

            let fill = Fill {
                id: FillId::deterministic(id, fill_seq),
                pair,
                taker_order_id: id,
                taker,
                maker_order_id: maker_id,
                maker,
                price,
                quantity: fill_qty,
                quote_amount: quote,
                taker_side: side,
                executed_at: Utc::now(),
            };
            fill_seq += 1;

            tracing::debug!(
                fill = %fill.id,
                taker = %taker,
                maker = %maker,
                price = %price,
                qty = %fill_qty,
                maker_remaining = %snapshot.quantity,
                "Fill executed"
            );

            if snapshot.is_filled() {
                book.remove(maker_id)?;
                self.open_orders.remove(&maker_id);
                Self::release_slot(&mut self.open_per_user, maker);
                self.history.record(snapshot.clone());
                tracing::info!(order = %maker_id, owner = %maker, "Resting order filled");
            }

            fills.push(fill);
            makers.push(snapshot);
        }

        order.close(CloseReason::Executed);
        if !fills.is_empty() {
            self.history.record(order.clone());
        }

        let fill_root = compute_fill_root(&fills);
        tracing::info!(
            order = %id,
            taker = %taker,
            pair = %pair,
            side = %side,
            requested = %quantity,
            filled = %order.filled_qty(),
            fills = fills.len(),
            skipped = skipped.len(),
            fill_root = hex::encode(fill_root),
            "Market order executed"
        );

        Ok(MarketOrderReport {
            order,
            fills,
            makers,
            skipped,
            fill_root,
        })
    }

    /// Cancel a resting order, releasing its remaining commitment.
    ///
    /// # Errors
    /// - `OrderNotFound` if the order is unknown or already closed
    /// - `Unauthorized` if `caller` does not own it
    pub fn cancel_order(
        &mut self,
        ledger: &mut EscrowLedger,
        caller: UserId,
        order_id: OrderId,
    ) -> Result<Order> {
        let pair = *self
            .open_orders
            .get(&order_id)
            .ok_or(DaxError::OrderNotFound(order_id))?;
        let book = self
            .books
            .get_mut(&pair)
            .ok_or(DaxError::OrderNotFound(order_id))?;
        let resting = book.get(order_id).ok_or(DaxError::OrderNotFound(order_id))?;
        if resting.owner != caller {
            return Err(DaxError::Unauthorized { caller });
        }

        let (symbol, amount) = resting.required_escrow()?;
        if amount > Decimal::ZERO {
            ledger.release(caller, symbol, amount)?;
        }

        let mut order = book.remove(order_id)?;
        order.close(CloseReason::Cancelled);
        self.open_orders.remove(&order_id);
        Self::release_slot(&mut self.open_per_user, caller);
        self.history.record(order.clone());

        tracing::info!(
            order = %order_id,
            owner = %caller,
            released = %amount,
            symbol = %symbol,
            "Order cancelled"
        );
        Ok(order)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// A resting or closed order of `pair`.
    #[must_use]
    pub fn get_order(&self, pair: &TradingPair, order_id: OrderId) -> Option<&Order> {
        self.books
            .get(pair)
            .and_then(|book| book.get(order_id))
            .or_else(|| self.history.get(order_id).filter(|o| o.pair == *pair))
    }

    #[must_use]
    pub fn order_length(&self, pair: &TradingPair) -> OrderLength {
        let (buy, sell) = self.books.get(pair).map_or((0, 0), |book| {
            (book.len(OrderSide::Buy), book.len(OrderSide::Sell))
        });
        OrderLength {
            buy,
            sell,
            closed: self.history.len_for(pair),
        }
    }

    /// Resting orders on one side, oldest first.
    #[must_use]
    pub fn list_orders(&self, pair: &TradingPair, side: OrderSide) -> Vec<&Order> {
        self.books
            .get(pair)
            .map(|book| book.orders(side).collect())
            .unwrap_or_default()
    }

    /// Closed orders, most recent first.
    #[must_use]
    pub fn list_closed(&self, pair: &TradingPair, limit: usize) -> Vec<&Order> {
        self.history.list_closed(pair, limit)
    }

    #[must_use]
    pub fn open_order_count(&self, owner: UserId) -> usize {
        self.open_per_user.get(&owner).copied().unwrap_or(0)
    }

    /// The most recently assigned order id (`order:0` before the first order).
    #[must_use]
    pub fn last_order_id(&self) -> OrderId {
        self.last_order_id
    }

    #[must_use]
    pub fn book(&self, pair: &TradingPair) -> Option<&OrderBook> {
        self.books.get(pair)
    }

    #[must_use]
    pub fn history(&self) -> &OrderHistory {
        &self.history
    }
}
