//! # dax-matchcore
//!
//! **Order books and the market-order matcher for DAX.**
//!
//! - **OrderBook**: per-pair BUY and SELL queues of resting limit orders,
//!   oldest first
//! - **MatchingEngine**: admits limit orders (commit escrow, then rest) and
//!   walks the opposite queue for market orders, moving funds through the
//!   [`dax_ledger::EscrowLedger`] one atomic fill at a time
//! - **OrderHistory**: append-only record of closed orders
//! - **Determinism**: SHA-256 fill root over a market order's fills
//!
//! Limit orders never match at submission; matching is initiated only by
//! market orders.

pub mod determinism;
pub mod history;
pub mod matcher;
pub mod orderbook;

pub use determinism::{compute_fill_root, verify_fill_root};
pub use history::OrderHistory;
pub use matcher::{MarketOrderReport, MatchingEngine, OrderLength};
pub use orderbook::OrderBook;
