//! Exchange configuration.
//!
//! Loaded from JSON by the host process; every field except `admin` has a
//! default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DaxError, Result, UserId, constants};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// The only caller allowed to whitelist tokens.
    pub admin: UserId,
    /// Maximum open limit orders per user across all pairs.
    #[serde(default = "default_max_open_orders")]
    pub max_open_orders_per_user: usize,
    /// Skip resting orders owned by the market-order caller.
    #[serde(default)]
    pub prevent_self_trade: bool,
    /// Listing size used when a caller asks for closed orders without a limit.
    #[serde(default = "default_history_limit")]
    pub history_limit_default: usize,
}

fn default_max_open_orders() -> usize {
    constants::DEFAULT_MAX_OPEN_ORDERS_PER_USER
}

fn default_history_limit() -> usize {
    constants::DEFAULT_HISTORY_LIMIT
}

impl ExchangeConfig {
    /// Default configuration administered by `admin`.
    #[must_use]
    pub fn new(admin: UserId) -> Self {
        Self {
            admin,
            max_open_orders_per_user: default_max_open_orders(),
            prevent_self_trade: false,
            history_limit_default: default_history_limit(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_open_orders_per_user == 0 {
            return Err(DaxError::Configuration(
                "max_open_orders_per_user must be positive".into(),
            ));
        }
        if self.history_limit_default == 0 {
            return Err(DaxError::Configuration(
                "history_limit_default must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let admin = UserId::from_bytes([7; 16]);
        let json = format!(r#"{{"admin":"{}"}}"#, admin.0);
        let cfg = ExchangeConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg.admin, admin);
        assert_eq!(cfg.max_open_orders_per_user, 200);
        assert_eq!(cfg.history_limit_default, 100);
        assert!(!cfg.prevent_self_trade);
    }

    #[test]
    fn zero_order_cap_rejected() {
        let mut cfg = ExchangeConfig::new(UserId::new());
        cfg.max_open_orders_per_user = 0;
        assert!(matches!(cfg.validate(), Err(DaxError::Configuration(_))));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = ExchangeConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, DaxError::Serialization(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ExchangeConfig::from_file("/nonexistent/dax-config.json").unwrap_err();
        assert!(matches!(err, DaxError::Io(_)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = ExchangeConfig::new(UserId::new());
        let json = serde_json::to_string(&cfg).unwrap();
        let back = ExchangeConfig::from_json_str(&json).unwrap();
        assert_eq!(back.admin, cfg.admin);
        assert_eq!(back.max_open_orders_per_user, cfg.max_open_orders_per_user);
    }
}
