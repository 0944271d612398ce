//! Hanami application composition core.
//!
//! # Architecture Overview
//!
//! ```text
//!   Request
//!     │
//!     ▼
//! ┌──────────────────────────── Application ─────────────────────────────┐
//! │  middleware: request_logger → content_length → static_assets        │
//! │              → welcome → method_override → user layers              │
//! │                          │                                          │
//! │                          ▼                                          │
//! │  routing: mount composer (slices nested at prefixes, endpoints)     │
//! │                          │                                          │
//! │                          ▼                                          │
//! │  slices: route → action → rendering policy (view / null / status)   │
//! │                                                                     │
//! │  components: registry → requirements → container (boot order)      │
//! │  config: TOML + [environments.<env>] + env vars → AppConfig         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod application;
pub mod components;
pub mod config;
pub mod rendering;
pub mod routing;
pub mod slices;

// Request handling
pub mod middleware;

// Cross-cutting concerns
pub mod cli;
pub mod lifecycle;
pub mod observability;

pub use application::{Application, ApplicationBuilder, BootError};
pub use components::{Component, ComponentError, Container, Registry, Requirements};
pub use config::{AppConfig, ConfigError, Environment};
pub use lifecycle::Shutdown;
pub use rendering::{view_fn, RenderError, View};
pub use slices::{action_fn, Action, ActionError, ActionRequest, ActionResponse, Slice};
