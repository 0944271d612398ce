//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::environment::Environment;
use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const HANAMI_HOST: &str = "HANAMI_HOST";
pub const HANAMI_PORT: &str = "HANAMI_PORT";
pub const SERVE_STATIC_ASSETS: &str = "SERVE_STATIC_ASSETS";
pub const HANAMI_SLICES: &str = "HANAMI_SLICES";

/// Table holding per-environment overlays.
const ENVIRONMENTS_TABLE: &str = "environments";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Application already configured")]
    AlreadyConfigured,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, overlay and validate configuration from a TOML file, applying
/// overrides from the process environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content, &|key| std::env::var(key).ok())?;
    tracing::info!(
        path = %path.display(),
        environment = %config.environment,
        "Configuration loaded"
    );
    Ok(config)
}

/// Configuration from defaults plus environment overrides, for apps without a file.
pub fn from_env() -> Result<AppConfig, ConfigError> {
    parse_config("", &|key| std::env::var(key).ok())
}

/// Parse configuration text using `lookup` for environment variables.
pub fn parse_config<F>(content: &str, lookup: &F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut root: toml::Table = toml::from_str(content)?;
    let overlays = root.remove(ENVIRONMENTS_TABLE);

    let environment = Environment::from_lookup(lookup)
        .or_else(|| {
            root.get("environment")
                .and_then(|v| v.as_str())
                .map(Environment::from)
        })
        .unwrap_or_default();

    if let Some(toml::Value::Table(mut overlays)) = overlays {
        if let Some(toml::Value::Table(overlay)) = overlays.remove(environment.name()) {
            tracing::debug!(environment = %environment, "Applying environment overlay");
            merge_tables(&mut root, overlay);
        }
    }

    let mut config: AppConfig = toml::Value::Table(root).try_into()?;
    config.environment = environment;
    apply_env_overrides(&mut config, lookup)?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Deep-merge `overlay` into `base`; overlay scalars and arrays replace base values.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(HANAMI_HOST).filter(|h| !h.is_empty()) {
        config.server.host = host;
    }

    if let Some(port) = lookup(HANAMI_PORT).filter(|p| !p.is_empty()) {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: HANAMI_PORT,
            value: port.clone(),
        })?;
    }

    if let Some(serve) = lookup(SERVE_STATIC_ASSETS) {
        config.assets.serve = matches!(
            serve.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        );
    }

    if let Some(slices) = lookup(HANAMI_SLICES).filter(|s| !s.trim().is_empty()) {
        config.slices.load = Some(
            slices
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        );
    }

    Ok(())
}
