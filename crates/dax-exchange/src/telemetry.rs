//! Tracing bootstrap for host processes.

use dax_types::constants::DEFAULT_LOG_FILTER;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    #[default]
    Plain,
    Json,
}

/// Install a global fmt subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing(format: TracingFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match format {
        TracingFormat::Plain => builder.try_init().is_ok(),
        TracingFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::info!(
            engine = dax_types::constants::ENGINE_NAME,
            version = dax_types::constants::VERSION,
            format = ?format,
            "Tracing initialized"
        );
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        init_tracing(TracingFormat::Plain);
        assert!(!init_tracing(TracingFormat::Json));
    }

    #[test]
    fn format_parses_from_config() {
        let format: TracingFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, TracingFormat::Json);
        assert_eq!(TracingFormat::default(), TracingFormat::Plain);
    }
}
