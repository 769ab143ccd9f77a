//! # dax-types
//!
//! Shared types, errors, and configuration for the **DAX** exchange core.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Symbol`], [`TokenAddress`], [`UserId`], [`OrderId`], [`FillId`], [`TradingPair`]
//! - **Order model**: [`Order`], [`OrderSide`], [`OrderKind`], [`OrderStatus`], [`CloseReason`]
//! - **Fill model**: [`Fill`]
//! - **Escrow model**: [`EscrowAccount`]
//! - **Events**: [`ExchangeEvent`]
//! - **Configuration**: [`ExchangeConfig`]
//! - **Errors**: [`DaxError`] with `DAX_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod fill;
pub mod ids;
pub mod order;

pub use balance::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use fill::*;
pub use ids::*;
pub use order::*;

// Constants are accessed via `dax_types::constants::FOO`.
