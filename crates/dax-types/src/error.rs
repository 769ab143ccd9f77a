//! Error types for the DAX exchange core.
//!
//! All errors use the `DAX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Token registry errors
//! - 2xx: Balance / escrow errors
//! - 3xx: Order errors
//! - 4xx: Matching / invariant errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{OrderId, Symbol, TokenAddress, UserId};

/// Central error enum for all DAX core operations.
#[derive(Debug, Error)]
pub enum DaxError {
    // =================================================================
    // Registry Errors (1xx)
    // =================================================================
    /// The symbol has not been whitelisted.
    #[error("DAX_ERR_100: Token not whitelisted: {0}")]
    NotWhitelisted(Symbol),

    /// The symbol is already whitelisted with a different token reference.
    #[error("DAX_ERR_101: Token {symbol} already whitelisted with a different reference")]
    AlreadyWhitelisted { symbol: Symbol },

    /// `pair_symbols` and `pair_refs` have different lengths.
    #[error("DAX_ERR_102: Pair length mismatch: {symbols} symbols, {refs} references")]
    InvalidPairLengthMismatch { symbols: usize, refs: usize },

    /// The two symbols are not registered to trade against each other.
    #[error("DAX_ERR_103: Invalid trading pair {first}/{second}")]
    InvalidPair { first: Symbol, second: Symbol },

    /// The symbol could not be encoded into the fixed-width key.
    #[error("DAX_ERR_104: Invalid symbol: {reason}")]
    InvalidSymbol { reason: String },

    /// Administrative action attempted by someone other than the admin
    /// (or an order action by someone other than the owner).
    #[error("DAX_ERR_105: Unauthorized caller {caller}")]
    Unauthorized { caller: UserId },

    /// No whitelisted symbol is bound to this token reference.
    #[error("DAX_ERR_106: Unknown token reference {0}")]
    UnknownToken(TokenAddress),

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough available escrow to perform the operation.
    #[error("DAX_ERR_200: Insufficient {symbol} balance: need {needed}, have {available}")]
    InsufficientBalance {
        symbol: Symbol,
        needed: Decimal,
        available: Decimal,
    },

    /// A balance or notional computation overflowed.
    #[error("DAX_ERR_201: Arithmetic overflow")]
    ArithmeticOverflow,

    // =================================================================
    // Order Errors (3xx)
    // =================================================================
    /// Quantity or amount was zero or negative.
    #[error("DAX_ERR_300: Invalid quantity: {0}")]
    InvalidQuantity(Decimal),

    /// Limit price was zero or negative.
    #[error("DAX_ERR_301: Invalid price: {0}")]
    InvalidPrice(Decimal),

    /// The order does not exist or is no longer open.
    #[error("DAX_ERR_302: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order side could not be decoded.
    #[error("DAX_ERR_303: Invalid order side: {0}")]
    InvalidSide(String),

    /// Too many open orders for this user.
    #[error("DAX_ERR_304: Open order limit of {limit} reached for user")]
    OrderLimitExceeded { limit: usize },

    // =================================================================
    // Matching / Invariant Errors (4xx)
    // =================================================================
    /// Supply conservation invariant violated. Critical safety alert.
    #[error("DAX_ERR_400: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DAX_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("DAX_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values).
    #[error("DAX_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("DAX_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DaxError>;

impl From<std::io::Error> for DaxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DaxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    #[test]
    fn error_display_contains_prefix() {
        let err = DaxError::OrderNotFound(OrderId(12));
        let msg = format!("{err}");
        assert!(msg.starts_with("DAX_ERR_302"), "Got: {msg}");
        assert!(msg.contains("order:12"));
    }

    #[test]
    fn insufficient_balance_display() {
        let err = DaxError::InsufficientBalance {
            symbol: sym("TOKEN"),
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("DAX_ERR_200"));
        assert!(msg.contains("TOKEN"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn invalid_pair_display() {
        let err = DaxError::InvalidPair {
            first: sym("TOKEN"),
            second: sym("WAT"),
        };
        assert!(format!("{err}").contains("TOKEN/WAT"));
    }

    #[test]
    fn all_errors_have_dax_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(DaxError::NotWhitelisted(sym("BAT"))),
            Box::new(DaxError::InvalidPairLengthMismatch { symbols: 2, refs: 1 }),
            Box::new(DaxError::Unauthorized {
                caller: UserId::from_bytes([1; 16]),
            }),
            Box::new(DaxError::ArithmeticOverflow),
            Box::new(DaxError::InvalidQuantity(Decimal::ZERO)),
            Box::new(DaxError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("DAX_ERR_"),
                "Error missing DAX_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: DaxError = io.into();
        assert!(matches!(err, DaxError::Io(ref m) if m.contains("missing.json")));
    }
}
