//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the output format from configuration
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Installing twice is not an error; the first subscriber stays

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggerConfig};

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(config: &LoggerConfig) -> bool {
    let registry = tracing_subscriber::registry().with(filter(config));
    let result = match config.format {
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_falls_back() {
        let config = LoggerConfig {
            level: "not a level!!".to_string(),
            ..LoggerConfig::default()
        };
        // Never panics, whatever RUST_LOG holds.
        let _ = filter(&config);
    }

    #[test]
    fn test_second_init_is_refused() {
        let config = LoggerConfig::default();
        let _ = init(&config);
        assert!(!init(&config));
    }
}
