//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check naming patterns carry the placeholders rendering relies on
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::AppConfig;
use crate::rendering::naming::{ACTION_PLACEHOLDER, CONTROLLER_PLACEHOLDER};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ValidationError::new("server.port", "port must be non-zero"));
    }
    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "host must not be empty"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "timeout must be greater than zero",
        ));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "body size limit must be greater than zero",
        ));
    }

    for prefix in &config.assets.prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::new(
                "assets.prefixes",
                format!("prefix {prefix:?} must start with '/'"),
            ));
        }
    }

    for (field, pattern) in [
        ("rendering.controller_pattern", &config.rendering.controller_pattern),
        ("rendering.view_pattern", &config.rendering.view_pattern),
    ] {
        if let Some(message) = check_pattern(pattern) {
            errors.push(ValidationError::new(field, message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_pattern(pattern: &str) -> Option<String> {
    let controller = pattern.find(CONTROLLER_PLACEHOLDER);
    let action = pattern.find(ACTION_PLACEHOLDER);
    match (controller, action) {
        (Some(c), Some(a)) if c < a => None,
        (Some(_), Some(_)) => Some(format!(
            "{CONTROLLER_PLACEHOLDER} must come before {ACTION_PLACEHOLDER} in {pattern:?}"
        )),
        _ => Some(format!(
            "pattern {pattern:?} must contain {CONTROLLER_PLACEHOLDER} and {ACTION_PLACEHOLDER}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.assets.prefixes = vec!["assets".into()];
        config.rendering.view_pattern = "Views::%{action}".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["server.port", "assets.prefixes", "rendering.view_pattern"]
        );
    }

    #[test]
    fn test_placeholder_order() {
        let mut config = AppConfig::default();
        config.rendering.controller_pattern = "%{action}::%{controller}".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("must come before"));
    }
}
