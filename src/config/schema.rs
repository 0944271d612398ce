//! Configuration schema definitions.
//!
//! This module defines the complete settings structure of an application.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::environment::Environment;

/// Root configuration of an application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Runtime environment (development, test, production, ...).
    pub environment: Environment,

    /// Network bind settings.
    pub server: ServerConfig,

    /// Request logging and log output.
    pub logger: LoggerConfig,

    /// Static asset serving.
    pub assets: AssetsConfig,

    /// Security policy applied to action responses.
    pub security: SecurityConfig,

    /// Naming conventions used to pair actions with views.
    pub rendering: RenderingConfig,

    /// Which slices are loaded.
    pub slices: SlicesConfig,
}

impl AppConfig {
    /// Default configuration for the given environment.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    /// `host:port` string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2300,
            request_timeout_secs: 30,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Logger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Install the request logger middleware.
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Subscriber output format.
    pub format: LogFormat,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Install the static asset middleware.
    pub serve: bool,

    /// Directory files are served from.
    pub root: PathBuf,

    /// URL prefixes that are looked up on disk.
    pub prefixes: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            serve: false,
            root: PathBuf::from("public"),
            prefixes: vec!["/assets".to_string(), "/favicon.ico".to_string()],
        }
    }
}

/// Security policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// `X-Frame-Options` header value; empty disables the header.
    pub x_frame_options: String,

    /// `X-Content-Type-Options` header value; empty disables the header.
    pub x_content_type_options: String,

    /// `X-XSS-Protection` header value; empty disables the header.
    pub x_xss_protection: String,

    /// `Content-Security-Policy` header value; empty disables the header.
    pub content_security_policy: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            x_frame_options: "DENY".to_string(),
            x_content_type_options: "nosniff".to_string(),
            x_xss_protection: "1; mode=block".to_string(),
            content_security_policy: "default-src 'self'; script-src 'self'; object-src 'none'"
                .to_string(),
        }
    }
}

impl SecurityConfig {
    /// Non-empty security headers as `(name, value)` pairs.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            ("x-frame-options", self.x_frame_options.as_str()),
            ("x-content-type-options", self.x_content_type_options.as_str()),
            ("x-xss-protection", self.x_xss_protection.as_str()),
            ("content-security-policy", self.content_security_policy.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

/// Rendering conventions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Pattern an action's controller class name follows.
    pub controller_pattern: String,

    /// Pattern the matching view name is derived from.
    pub view_pattern: String,

    /// Directory holding `<status>.html` pages that replace the built-in ones.
    pub status_pages: Option<PathBuf>,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            controller_pattern: "Controllers::%{controller}::%{action}".to_string(),
            view_pattern: "Views::%{controller}::%{action}".to_string(),
            status_pages: None,
        }
    }
}

/// Slice loading.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SlicesConfig {
    /// Allow list of slice names. `None` loads every slice.
    pub load: Option<Vec<String>>,
}

impl SlicesConfig {
    pub fn should_load(&self, name: &str) -> bool {
        match &self.load {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("environment = \"test\"").unwrap();
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.server.port, 2300);
        assert_eq!(config.rendering.view_pattern, "Views::%{controller}::%{action}");
        assert!(config.logger.enabled);
        assert!(!config.assets.serve);
    }

    #[test]
    fn test_security_headers_skip_empty_values() {
        let security = SecurityConfig {
            x_xss_protection: String::new(),
            ..SecurityConfig::default()
        };
        let names: Vec<_> = security.headers().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["x-frame-options", "x-content-type-options", "content-security-policy"]
        );
    }

    #[test]
    fn test_slice_allow_list() {
        let all = SlicesConfig::default();
        assert!(all.should_load("admin"));

        let some = SlicesConfig { load: Some(vec!["web".into()]) };
        assert!(some.should_load("web"));
        assert!(!some.should_load("admin"));
    }
}
