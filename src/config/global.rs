//! Process-wide configuration, assignable exactly once.
//!
//! Applications receive their configuration explicitly; this cell exists
//! for code that has no path to the application (CLI helpers, plugins).

use std::sync::{Arc, Mutex, OnceLock};

use crate::config::loader::ConfigError;
use crate::config::schema::AppConfig;

/// A sealed, set-once configuration slot.
#[derive(Default)]
pub struct ConfigCell {
    guard: Mutex<()>,
    value: OnceLock<Arc<AppConfig>>,
}

impl ConfigCell {
    pub const fn new() -> Self {
        Self {
            guard: Mutex::new(()),
            value: OnceLock::new(),
        }
    }

    /// Seal `config` into the cell. Fails if the cell already holds a value.
    pub fn configure(&self, config: AppConfig) -> Result<Arc<AppConfig>, ConfigError> {
        // A poisoned guard only means another configure panicked; the
        // OnceLock still decides the outcome.
        let _lock = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        if self.value.get().is_some() {
            tracing::error!("Attempted to configure the application twice");
            return Err(ConfigError::AlreadyConfigured);
        }
        let config = Arc::new(config);
        self.value
            .set(config.clone())
            .map_err(|_| ConfigError::AlreadyConfigured)?;
        tracing::debug!(environment = %config.environment, "Global configuration sealed");
        Ok(config)
    }

    pub fn get(&self) -> Option<Arc<AppConfig>> {
        self.value.get().cloned()
    }

    pub fn is_configured(&self) -> bool {
        self.value.get().is_some()
    }
}

static GLOBAL: ConfigCell = ConfigCell::new();

/// Seal the process-wide configuration.
pub fn configure(config: AppConfig) -> Result<Arc<AppConfig>, ConfigError> {
    GLOBAL.configure(config)
}

/// The process-wide configuration, if one was sealed.
pub fn configuration() -> Option<Arc<AppConfig>> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_second_configure_fails_and_keeps_first() {
        let cell = ConfigCell::new();
        assert!(!cell.is_configured());

        cell.configure(AppConfig::for_environment(Environment::Production))
            .unwrap();
        let err = cell
            .configure(AppConfig::for_environment(Environment::Test))
            .unwrap_err();

        assert!(matches!(err, ConfigError::AlreadyConfigured));
        assert_eq!(cell.get().unwrap().environment, Environment::Production);
    }

    #[test]
    fn test_concurrent_configure_has_one_winner() {
        let cell = Arc::new(ConfigCell::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || cell.configure(AppConfig::default()).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
    }
}
