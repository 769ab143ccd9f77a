//! The order book for a single trading pair.
//!
//! Each side is a `VecDeque` in arrival order: the front is the oldest
//! resting order and is filled first. There is no price re-sorting; the
//! matcher walks a side front to back.
//!
//! An auxiliary `HashMap<OrderId, OrderSide>` resolves which queue holds an
//! order without scanning both.

use std::collections::{HashMap, VecDeque};

use dax_types::{DaxError, Order, OrderId, OrderKind, OrderSide, Result, TradingPair};

/// Resting limit orders for one pair.
#[derive(Debug)]
pub struct OrderBook {
    pub pair: TradingPair,
    buys: VecDeque<Order>,
    sells: VecDeque<Order>,
    index: HashMap<OrderId, OrderSide>,
}

impl OrderBook {
    #[must_use]
    pub fn new(pair: TradingPair) -> Self {
        Self {
            pair,
            buys: VecDeque::new(),
            sells: VecDeque::new(),
            index: HashMap::new(),
        }
    }

    fn side(&self, side: OrderSide) -> &VecDeque<Order> {
        match side {
            OrderSide::Buy => &self.buys,
            OrderSide::Sell => &self.sells,
        }
    }

    fn side_mut(&mut self, side: OrderSide) -> &mut VecDeque<Order> {
        match side {
            OrderSide::Buy => &mut self.buys,
            OrderSide::Sell => &mut self.sells,
        }
    }

    /// Append a limit order to the back of its side.
    pub fn insert(&mut self, order: Order) -> Result<()> {
        if order.pair != self.pair || order.kind != OrderKind::Limit {
            return Err(DaxError::Internal(format!(
                "{} {} cannot rest in the {} book",
                order.kind, order.id, self.pair
            )));
        }
        if self.index.contains_key(&order.id) {
            return Err(DaxError::Internal(format!("{} already resting", order.id)));
        }
        self.index.insert(order.id, order.side);
        self.side_mut(order.side).push_back(order);
        Ok(())
    }

    /// Remove an order from active consideration and return it.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if the order is not resting here.
    pub fn remove(&mut self, order_id: OrderId) -> Result<Order> {
        let side = self
            .index
            .remove(&order_id)
            .ok_or(DaxError::OrderNotFound(order_id))?;
        let queue = self.side_mut(side);
        let pos = queue
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(DaxError::OrderNotFound(order_id))?;
        queue.remove(pos).ok_or(DaxError::OrderNotFound(order_id))
    }

    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let side = self.index.get(&order_id)?;
        self.side(*side).iter().find(|o| o.id == order_id)
    }

    pub fn get_mut(&mut self, order_id: OrderId) -> Option<&mut Order> {
        let side = *self.index.get(&order_id)?;
        self.side_mut(side).iter_mut().find(|o| o.id == order_id)
    }

    /// Orders on `side`, oldest first.
    pub fn orders(&self, side: OrderSide) -> impl Iterator<Item = &Order> {
        self.side(side).iter()
    }

    /// Ids on `side`, oldest first. Snapshot for a matching walk.
    #[must_use]
    pub fn order_ids(&self, side: OrderSide) -> Vec<OrderId> {
        self.side(side).iter().map(|o| o.id).collect()
    }

    #[must_use]
    pub fn len(&self, side: OrderSide) -> usize {
        self.side(side).len()
    }

    /// Total resting orders on both sides.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }
}

#[cfg(test)]
mod tests {
    use dax_types::{Symbol, UserId};
    use rust_decimal::Decimal;

    use super::*;

    fn make_order(id: u64, side: OrderSide) -> Order {
        Order::dummy_limit(id, side, Decimal::new(10, 0), Decimal::ONE)
    }

    fn book() -> OrderBook {
        OrderBook::new(Order::dummy_pair())
    }

    #[test]
    fn sides_keep_arrival_order() {
        let mut book = book();
        book.insert(make_order(1, OrderSide::Sell)).unwrap();
        book.insert(make_order(2, OrderSide::Buy)).unwrap();
        book.insert(make_order(3, OrderSide::Sell)).unwrap();

        assert_eq!(book.order_ids(OrderSide::Sell), vec![OrderId(1), OrderId(3)]);
        assert_eq!(book.order_ids(OrderSide::Buy), vec![OrderId(2)]);
        assert_eq!(book.order_count(), 3);
        assert_eq!(book.len(OrderSide::Sell), 2);
    }

    #[test]
    fn no_price_reordering() {
        let mut book = book();
        book.insert(Order::dummy_limit(1, OrderSide::Sell, Decimal::new(12, 0), Decimal::ONE))
            .unwrap();
        book.insert(Order::dummy_limit(2, OrderSide::Sell, Decimal::new(9, 0), Decimal::ONE))
            .unwrap();
        let prices: Vec<_> = book.orders(OrderSide::Sell).filter_map(|o| o.price).collect();
        assert_eq!(prices, vec![Decimal::new(12, 0), Decimal::new(9, 0)]);
    }

    #[test]
    fn remove_returns_order() {
        let mut book = book();
        book.insert(make_order(1, OrderSide::Buy)).unwrap();
        book.insert(make_order(2, OrderSide::Buy)).unwrap();

        let removed = book.remove(OrderId(1)).unwrap();
        assert_eq!(removed.id, OrderId(1));
        assert!(!book.contains(OrderId(1)));
        assert_eq!(book.order_ids(OrderSide::Buy), vec![OrderId(2)]);
    }

    #[test]
    fn remove_twice_fails() {
        let mut book = book();
        book.insert(make_order(1, OrderSide::Buy)).unwrap();
        book.remove(OrderId(1)).unwrap();
        assert!(matches!(
            book.remove(OrderId(1)),
            Err(DaxError::OrderNotFound(OrderId(1)))
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn duplicate_rejected() {
        let mut book = book();
        book.insert(make_order(1, OrderSide::Buy)).unwrap();
        assert!(book.insert(make_order(1, OrderSide::Sell)).is_err());
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn market_orders_do_not_rest() {
        let mut book = book();
        let market = Order::market(
            OrderId(4),
            UserId::new(),
            Order::dummy_pair(),
            OrderSide::Buy,
            Decimal::ONE,
        );
        assert!(book.insert(market).is_err());
    }

    #[test]
    fn wrong_pair_rejected() {
        let mut book = OrderBook::new(TradingPair::new(
            Symbol::new("BAT").unwrap(),
            Symbol::new("HYDRO").unwrap(),
        ));
        assert!(book.insert(make_order(1, OrderSide::Sell)).is_err());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut book = book();
        book.insert(Order::dummy_limit(1, OrderSide::Sell, Decimal::new(10, 0), Decimal::new(5, 0)))
            .unwrap();
        book.get_mut(OrderId(1)).unwrap().apply_fill(Decimal::new(2, 0));
        assert_eq!(book.get(OrderId(1)).unwrap().quantity, Decimal::new(3, 0));
        assert!(book.get(OrderId(9)).is_none());
    }
}
