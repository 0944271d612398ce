//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Boot application → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Boot completes before the listener is bound (traffic only when ready)
//! - Shutdown is a broadcast so tests can stop a server without signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
