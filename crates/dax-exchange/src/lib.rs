//! # dax-exchange
//!
//! The inbound surface of the DAX core. A host process (contract runtime,
//! RPC server, embedding application) owns persistence and transport and
//! calls into an [`Exchange`] with an explicit caller identity on every
//! mutating request.
//!
//! ```text
//! whitelist (admin) → deposit → limit_order / market_order / cancel_order → withdraw
//! ```
//!
//! [`SharedExchange`] serializes writers behind one lock so no two
//! operations can observe the same available balance.

pub mod exchange;
pub mod shared;
pub mod telemetry;

pub use exchange::Exchange;
pub use shared::SharedExchange;
pub use telemetry::{TracingFormat, init_tracing};

pub use dax_matchcore::{MarketOrderReport, OrderLength};
