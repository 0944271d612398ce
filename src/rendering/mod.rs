//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Boot (per slice):
//!     action key → naming.rs (controller class → view name)
//!     → slice views → ViewBinding (view or null)
//!
//! Request:
//!     ActionResponse → policy.rs
//!         → bound view (body empty, format renderable)
//!         → null view (existing body passes through)
//!         → status.rs (unsuccessful HTML with no body)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - View lookup happens once at boot, never per request
//! - A naming mismatch fails boot instead of the first request

pub mod naming;
pub mod policy;
pub mod status;
pub mod view;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub use naming::{derive_view_name, ViewNaming};
pub use policy::RenderingPolicy;
pub use status::{StatusPages, STATUS_PAGES};
pub use view::{view_fn, NullView, RenderContext, View, ViewBinding};

/// Errors raised while deriving view names or rendering views.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Controller name {name:?} does not match pattern {pattern:?}")]
    NamingMismatch { name: String, pattern: String },

    #[error("Invalid naming pattern {pattern:?}")]
    InvalidPattern { pattern: String },

    #[error("View {view} failed: {message}")]
    View { view: String, message: String },

    #[error("Render failed: {0}")]
    Failed(String),
}

impl RenderError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Attribute a failure to the view named `view`.
    pub fn in_view(self, view: &str) -> Self {
        match self {
            RenderError::Failed(message) => RenderError::View {
                view: view.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
