//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (boot, resolution, mounts)
//!     → request spans from the request logger middleware
//!
//! logging.rs installs the subscriber (compact, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the request span

pub mod logging;
