//! Append-only record of closed orders.

use std::collections::HashMap;

use dax_types::{Order, OrderId, TradingPair};

#[derive(Debug, Default)]
pub struct OrderHistory {
    closed: Vec<Order>,
    by_pair: HashMap<TradingPair, Vec<usize>>,
    by_id: HashMap<OrderId, usize>,
}

impl OrderHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a closed order. Nothing recorded is ever changed or removed.
    pub fn record(&mut self, order: Order) {
        debug_assert!(!order.is_active(), "only closed orders enter history");
        let slot = self.closed.len();
        self.by_pair.entry(order.pair).or_default().push(slot);
        self.by_id.insert(order.id, slot);
        self.closed.push(order);
    }

    /// Up to `limit` closed orders for `pair`, most recent first.
    #[must_use]
    pub fn list_closed(&self, pair: &TradingPair, limit: usize) -> Vec<&Order> {
        self.by_pair
            .get(pair)
            .map(|slots| {
                slots
                    .iter()
                    .rev()
                    .take(limit)
                    .map(|slot| &self.closed[*slot])
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.by_id.get(&order_id).map(|slot| &self.closed[*slot])
    }

    /// Closed orders recorded for `pair`.
    #[must_use]
    pub fn len_for(&self, pair: &TradingPair) -> usize {
        self.by_pair.get(pair).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.closed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }
}
