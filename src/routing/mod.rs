//! Routing and mount composition subsystem.
//!
//! # Data Flow
//! ```text
//! Boot:
//!     slice route definitions
//!     → pattern.rs (":id" / "*rest" → axum syntax)
//!     → slice router (one MethodRouter per path)
//!     → mount.rs (nest under prefix, merge at root, endpoints as services)
//!     → combined axum Router (immutable)
//!     → routes.rs (flat table for inspection)
//!
//! Request:
//!     path → prefix match → nested slice router → action handler
//! ```
//!
//! # Design Decisions
//! - Routes compiled at boot, immutable at runtime
//! - Prefix matching is segment-aware
//! - Unmatched paths fall through to 404 (or the welcome page)

pub mod mount;
pub mod pattern;
pub mod prefix;
pub mod routes;

pub use mount::{Mount, MountComposer, MountTarget};
pub use pattern::{PathPattern, PatternError};
pub use prefix::MountPrefix;
pub use routes::{RouteEntry, RouteTable};
