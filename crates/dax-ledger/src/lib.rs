//! # dax-ledger
//!
//! **Custody layer**: which tokens may be held and traded, and how much of
//! each every user has in escrow.
//!
//! ## Components
//!
//! 1. **TokenRegistry**: whitelisted symbols, their token references, and
//!    the counter-symbols each may trade against
//! 2. **EscrowLedger**: per-(user, symbol) balances with available/committed
//!    accounting; atomic multi-leg transfers for fills
//! 3. **SupplyConservation**: `Σ balances == Σ deposits - Σ withdrawals`
//!
//! ## Flow
//!
//! ```text
//! whitelist → deposit → commit (limit order) → transfer (fill) / release (cancel) → withdraw
//! ```

pub mod escrow_ledger;
pub mod supply_conservation;
pub mod token_registry;

pub use escrow_ledger::{BalanceSource, EscrowLedger, Transfer};
pub use supply_conservation::SupplyConservation;
pub use token_registry::{TokenEntry, TokenRegistry};
