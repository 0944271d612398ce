//! Mount composition.
//!
//! # Responsibilities
//! - Nest each slice router under its prefix
//! - Mount plain endpoints (any tower service) under their prefix
//! - Combine everything into one axum router
//!
//! # Design Decisions
//! - Slices at "/" are merged, endpoints at "/" become the fallback
//! - Overlapping prefixes are allowed and logged; the router decides
//! - Requests outside every prefix fall through to axum's 404

use std::convert::Infallible;

use axum::{extract::Request, response::IntoResponse, Router};
use tower::Service;

use crate::routing::prefix::MountPrefix;

/// What a prefix delegates to.
#[derive(Clone)]
pub enum MountTarget {
    /// A slice router; its routes are scoped under the prefix.
    Slice(Router),
    /// An opaque service receiving every request under the prefix.
    Endpoint(Router),
}

/// A sub-application paired with the prefix it is mounted at.
#[derive(Clone)]
pub struct Mount {
    pub name: String,
    pub prefix: MountPrefix,
    pub target: MountTarget,
}

impl Mount {
    pub fn slice(name: impl Into<String>, prefix: MountPrefix, router: Router) -> Self {
        Self {
            name: name.into(),
            prefix,
            target: MountTarget::Slice(router),
        }
    }

    /// Wrap any tower service as an endpoint mount.
    pub fn endpoint<S>(prefix: MountPrefix, service: S) -> Self
    where
        S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        Self {
            name: format!("endpoint {prefix}"),
            prefix,
            target: MountTarget::Endpoint(Router::new().fallback_service(service)),
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self.target, MountTarget::Slice(_))
    }
}

/// Builds the combined router out of individual mounts.
#[derive(Default)]
pub struct MountComposer {
    mounts: Vec<Mount>,
}

impl MountComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mount: Mount) -> &mut Self {
        for existing in &self.mounts {
            if existing.prefix.overlaps(&mount.prefix) {
                tracing::warn!(
                    first = %existing.name,
                    first_prefix = %existing.prefix,
                    second = %mount.name,
                    second_prefix = %mount.prefix,
                    "Mount prefixes overlap"
                );
            }
        }
        self.mounts.push(mount);
        self
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Combine every mount into one router.
    pub fn compose(self) -> Router {
        let mut router = Router::new();
        for mount in self.mounts {
            tracing::info!(
                mount = %mount.name,
                prefix = %mount.prefix,
                slice = mount.is_slice(),
                "Mounting"
            );
            router = match (mount.target, mount.prefix.is_root()) {
                (MountTarget::Slice(inner), true) => router.merge(inner),
                (MountTarget::Slice(inner), false) => router.nest(mount.prefix.as_str(), inner),
                (MountTarget::Endpoint(inner), true) => router.fallback_service(inner),
                (MountTarget::Endpoint(inner), false) => {
                    router.nest_service(mount.prefix.as_str(), inner)
                }
            };
        }
        router
    }
}
