//! Component registration and dependency resolution.
//!
//! # Data Flow
//! ```text
//! Boot:
//!     builder registers components by dotted name ("apps.web", "routes")
//!     → container.rs (graph check: missing deps, cycles, topological order)
//!     → registry.rs (resolve each name once, cache the value)
//!     → Container (immutable snapshot with typed accessors)
//!
//! Inside a component's resolve:
//!     requirements.rs (resolve declared names first, strict lookups)
//! ```
//!
//! # Design Decisions
//! - A name resolves at most once; the cache is never invalidated
//! - Requirements are declarative (`Component::requires`), not ambient
//! - Cycles are reported as errors, never recursed into
//! - No lock is held while a component resolves

pub mod container;
pub mod registry;
pub mod requirements;

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

pub use container::Container;
pub use registry::Registry;
pub use requirements::Requirements;

/// A resolved component value.
pub type Resolved = Arc<dyn Any + Send + Sync>;

/// Errors raised while registering or resolving components.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Component not registered: {name}")]
    NotRegistered { name: String },

    #[error("Component {name:?} has not been resolved (resolved: [{}])", .resolved.join(", "))]
    NotResolved { name: String, resolved: Vec<String> },

    #[error("Component {name:?} is not among declared requirements [{}]", .declared.join(", "))]
    Undeclared { name: String, declared: Vec<String> },

    #[error("Component {component:?} requires unregistered {requirement:?}")]
    MissingDependency {
        component: String,
        requirement: String,
    },

    #[error("Dependency cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Component {name:?} is not a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("Component {name:?} failed to resolve: {message}")]
    Failed { name: String, message: String },
}

impl ComponentError {
    /// Wrap an arbitrary failure raised by a component's resolve.
    pub fn failed(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// A named, lazily resolved unit of application behavior.
pub trait Component: Send + Sync + 'static {
    /// Names that must be resolved before this component resolves.
    fn requires(&self) -> Vec<String> {
        Vec::new()
    }

    /// Produce this component's value. `deps` holds every declared requirement.
    fn resolve(&self, deps: &Requirements<'_>) -> Result<Resolved, ComponentError>;
}

/// A component backed by a closure.
pub struct FnComponent<F> {
    requires: Vec<String>,
    resolve: F,
}

impl<F> FnComponent<F>
where
    F: Fn(&Requirements<'_>) -> Result<Resolved, ComponentError> + Send + Sync + 'static,
{
    pub fn new<I, S>(requires: I, resolve: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requires: requires.into_iter().map(Into::into).collect(),
            resolve,
        }
    }
}

impl<F> Component for FnComponent<F>
where
    F: Fn(&Requirements<'_>) -> Result<Resolved, ComponentError> + Send + Sync + 'static,
{
    fn requires(&self) -> Vec<String> {
        self.requires.clone()
    }

    fn resolve(&self, deps: &Requirements<'_>) -> Result<Resolved, ComponentError> {
        (self.resolve)(deps)
    }
}

/// Downcast a resolved value, naming the component on failure.
pub(crate) fn downcast<T>(name: &str, value: Resolved) -> Result<Arc<T>, ComponentError>
where
    T: Send + Sync + 'static,
{
    value
        .downcast::<T>()
        .map_err(|_| ComponentError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
}
