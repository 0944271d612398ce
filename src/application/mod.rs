//! Application façade.
//!
//! # Data Flow
//! ```text
//! ApplicationBuilder (builder.rs)
//!     → resolve apps: slices + components → Container
//!     → mount: slice routers + endpoints → axum Router
//!     → middleware: fixed order + user layers → Endpoint
//!     → Application
//!
//! Request → Application::call / tower::Service
//!     → middleware → router → slice dispatch → Response
//!
//! server.rs: Application → axum::serve (graceful shutdown)
//! ```
//!
//! # Design Decisions
//! - Boot runs once and either yields a complete application or an error
//! - The booted application is immutable and cheap to clone
//! - Configuration is passed in; the global cell is never consulted

pub mod builder;
pub mod server;

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use thiserror::Error;
use tower::{Service, ServiceExt};

use crate::components::{ComponentError, Container};
use crate::config::{AppConfig, ConfigError};
use crate::middleware::{Endpoint, MiddlewareError};
use crate::routing::{PatternError, RouteTable};

pub use builder::ApplicationBuilder;

/// Component name of the combined route table.
pub const ROUTES: &str = "routes";

/// Why boot failed.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    #[error("{mount} cannot be mounted: {source}")]
    InvalidPrefix {
        mount: String,
        #[source]
        source: PatternError,
    },

    #[error("Prefix {prefix} is mounted by both {first} and {second}")]
    DuplicateMount {
        prefix: String,
        first: String,
        second: String,
    },
}

struct Booted {
    config: Arc<AppConfig>,
    container: Container,
    routes: Arc<RouteTable>,
    middleware: Vec<String>,
}

/// A booted application: one request-handling entry point.
#[derive(Clone)]
pub struct Application {
    booted: Arc<Booted>,
    service: Endpoint,
}

impl Application {
    pub fn builder(config: AppConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    /// Handle one request.
    pub async fn call(&self, request: Request) -> Response {
        match self.service.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.booted.config
    }

    pub fn container(&self) -> &Container {
        &self.booted.container
    }

    pub fn routes(&self) -> &RouteTable {
        &self.booted.routes
    }

    /// Middleware names, outermost first.
    pub fn middleware(&self) -> &[String] {
        &self.booted.middleware
    }

    /// The application as an axum router, for embedding.
    pub fn into_router(self) -> Router {
        Router::new().fallback_service(self.service)
    }
}

impl Service<Request> for Application {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("environment", &self.booted.config.environment)
            .field("routes", &self.booted.routes.len())
            .field("middleware", &self.booted.middleware)
            .finish()
    }
}
