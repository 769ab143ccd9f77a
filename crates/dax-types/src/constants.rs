//! System-wide constants for the DAX core.

/// Default maximum number of open limit orders per user.
pub const DEFAULT_MAX_OPEN_ORDERS_PER_USER: usize = 200;

/// Default number of closed orders returned by a history listing.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "DAX";
