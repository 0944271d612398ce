//! Application configuration subsystem.
//!
//! # Data Flow
//! ```text
//! config/app.toml
//!     → loader.rs (parse, overlay [environments.<env>], env var overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc with the registry, slices and middleware
//!
//! Optional process-wide copy:
//!     global.rs (configure exactly once, sealed afterwards)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Environment is decided before the overlay is applied, so an overlay
//!   table can never change which overlay was selected

pub mod environment;
pub mod global;
pub mod loader;
pub mod schema;
pub mod validation;

pub use environment::Environment;
pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, AssetsConfig, LogFormat, LoggerConfig, RenderingConfig, SecurityConfig,
    ServerConfig, SlicesConfig,
};
