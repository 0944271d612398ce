//! Slices: self-contained sub-applications.
//!
//! # Data Flow
//! ```text
//! Slice::builder("web")
//!     → actions, views, routes (declarative)
//!     → SliceComponent registered as "apps.web"
//!     → resolve: bind views, validate routes, build axum router
//!     → LoadedSlice (router + route entries + bindings)
//!
//! Request → slice router → Dispatch
//!     → ActionRequest/ActionResponse → Action::call
//!     → RenderingPolicy → Response
//! ```
//!
//! # Design Decisions
//! - A slice is a component like any other; its requirements are
//!   resolved before it loads
//! - Everything that can be checked is checked at load time

pub mod action;
pub mod dispatch;
pub mod slice;

use axum::http::Method;
use thiserror::Error;

use crate::components::ComponentError;
use crate::rendering::RenderError;
use crate::routing::PatternError;

pub use action::{
    action_fn, Action, ActionError, ActionKey, ActionRequest, ActionResponse, Exposures, Format,
    Params,
};
pub use slice::{LoadedSlice, Slice, SliceBuilder, SliceComponent};

/// Group slices are registered under.
pub const APPS: &str = "apps";

/// Component name of the slice called `name`.
pub fn component_name(name: &str) -> String {
    format!("{APPS}.{name}")
}

/// Errors raised while loading a slice.
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("Invalid action key {key:?}, expected \"controller.action\"")]
    InvalidActionKey { key: String },

    #[error("Route {method} {path} points to unknown action {key:?}")]
    UnknownAction {
        method: Method,
        path: String,
        key: String,
    },

    #[error("Route {method} {path} is defined more than once")]
    DuplicateRoute { method: Method, path: String },

    #[error("Route path {path} conflicts with {existing}")]
    ConflictingPaths { path: String, existing: String },

    #[error("Method {method} cannot be routed")]
    UnsupportedMethod { method: Method },

    #[error("Invalid response header {name}")]
    InvalidHeader { name: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("web"), "apps.web");
    }
}
