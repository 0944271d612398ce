//! Application boot.
//!
//! # Responsibilities
//! - Collect components, slices, endpoint mounts and user middleware
//! - Run the boot sequence once: resolve apps, mount, middleware, run
//!
//! # Design Decisions
//! - Boot order is fixed and linear; each step fails boot on error
//! - Slices outside `slices.load` are never registered
//! - The welcome page replaces the router only when nothing is routed
//!   and the environment is not test
//! - Mount prefixes and cross-slice route shapes are checked before the
//!   router is composed, so conflicts are boot errors

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::IntoResponse;
use tower::Service;

use crate::application::{Application, BootError, Booted, ROUTES};
use crate::components::{Component, ComponentError, Container, Registry, Requirements, Resolved};
use crate::config::validation::validate_config;
use crate::config::{AppConfig, ConfigError};
use crate::middleware::static_assets::StaticAssets;
use crate::middleware::{
    content_length, endpoint, method_override, request_logger, static_assets, welcome, Middleware,
    MiddlewareError, MiddlewareStack,
};
use crate::rendering::{StatusPages, STATUS_PAGES};
use crate::routing::{Mount, MountComposer, MountPrefix, PathPattern, RouteEntry, RouteTable};
use crate::slices::{component_name, LoadedSlice, Slice, APPS};

/// Collects everything an application is made of, then boots it.
pub struct ApplicationBuilder {
    config: AppConfig,
    components: Vec<(String, Arc<dyn Component>)>,
    slices: Vec<Slice>,
    endpoints: Vec<Mount>,
    middleware: Vec<Placement>,
}

/// Where a user middleware goes in the stack.
enum Placement {
    Append(Middleware),
    Before(String, Middleware),
    After(String, Middleware),
}

impl ApplicationBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            components: Vec::new(),
            slices: Vec::new(),
            endpoints: Vec::new(),
            middleware: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register an application-level component.
    pub fn component(mut self, name: impl Into<String>, component: impl Component) -> Self {
        self.components.push((name.into(), Arc::new(component)));
        self
    }

    /// Register a closure as an application-level component.
    pub fn component_fn<I, S, F>(self, name: impl Into<String>, requires: I, resolve: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Requirements<'_>) -> Result<Resolved, ComponentError> + Send + Sync + 'static,
    {
        self.component(name, crate::components::FnComponent::new(requires, resolve))
    }

    /// Add a slice, mounted at its prefix.
    pub fn slice(mut self, slice: impl Into<Slice>) -> Self {
        self.slices.push(slice.into());
        self
    }

    /// Mount any tower service at `prefix`.
    pub fn mount<S>(mut self, prefix: impl Into<MountPrefix>, service: S) -> Self
    where
        S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        self.endpoints.push(Mount::endpoint(prefix.into(), service));
        self
    }

    /// Append user middleware; it runs inside the built-in entries.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(Placement::Append(middleware));
        self
    }

    /// Insert user middleware right outside the entry named `target`.
    /// An unknown `target` fails boot.
    pub fn middleware_before(mut self, target: impl Into<String>, middleware: Middleware) -> Self {
        self.middleware.push(Placement::Before(target.into(), middleware));
        self
    }

    /// Insert user middleware right inside the entry named `target`.
    pub fn middleware_after(mut self, target: impl Into<String>, middleware: Middleware) -> Self {
        self.middleware.push(Placement::After(target.into(), middleware));
        self
    }

    /// Append a tower layer as user middleware.
    pub fn layer<L>(self, name: impl Into<String>, layer: L) -> Self
    where
        L: tower::Layer<crate::middleware::Endpoint> + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.middleware(Middleware::layer(name, layer))
    }

    /// Run the boot sequence.
    pub fn boot(self) -> Result<Application, BootError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;
        let config = Arc::new(self.config);

        let prefixes = self
            .slices
            .iter()
            .map(|slice| (slice.name(), slice.prefix()))
            .chain(self.endpoints.iter().map(|mount| (mount.name.as_str(), &mount.prefix)));
        for (mount, prefix) in prefixes {
            prefix.validate().map_err(|source| BootError::InvalidPrefix {
                mount: mount.to_string(),
                source,
            })?;
        }

        tracing::info!(
            environment = %config.environment,
            slices = self.slices.len(),
            endpoints = self.endpoints.len(),
            "Booting application"
        );

        // 1. Resolve apps
        let registry = Registry::new(Arc::clone(&config));
        for (name, component) in self.components {
            registry.register_arc(name, component);
        }
        registry.register_fn(STATUS_PAGES, Vec::<String>::new(), |deps| {
            let pages = match &deps.config().rendering.status_pages {
                Some(dir) => {
                    StatusPages::load(dir).map_err(|e| ComponentError::failed(STATUS_PAGES, e))?
                }
                None => StatusPages::builtin(),
            };
            Ok(Arc::new(pages) as Resolved)
        });

        let mut apps = Vec::new();
        for slice in self.slices {
            if !config.slices.should_load(slice.name()) {
                tracing::info!(slice = %slice.name(), "Slice not in load list, skipped");
                continue;
            }
            let name = component_name(slice.name());
            registry.register(name.clone(), slice.into_component());
            apps.push(name);
        }

        let endpoint_routes: Vec<RouteEntry> = self
            .endpoints
            .iter()
            .map(|mount| RouteEntry {
                method: "*".to_string(),
                path: mount.prefix.to_string(),
                to: mount.name.clone(),
                name: None,
            })
            .collect();
        registry.register_fn(ROUTES, apps.clone(), move |deps| {
            build_route_table(deps, &endpoint_routes).map(|table| Arc::new(table) as Resolved)
        });

        let container = Container::boot(&registry)?;

        // 2. Mount
        let mut composer = MountComposer::new();
        let mut prefixes: HashMap<String, String> = HashMap::new();
        let slices = container.group::<LoadedSlice>(APPS)?;
        let mounts = slices
            .iter()
            .map(|(_, loaded)| Mount::slice(&loaded.name, loaded.prefix.clone(), loaded.router.clone()))
            .chain(self.endpoints);
        for mount in mounts {
            if let Some(first) = prefixes.insert(mount.prefix.to_string(), mount.name.clone()) {
                return Err(BootError::DuplicateMount {
                    prefix: mount.prefix.to_string(),
                    first,
                    second: mount.name,
                });
            }
            composer.add(mount);
        }
        let router = composer.compose();
        let routes = container.get_as::<RouteTable>(ROUTES)?;

        // 3. Middleware
        let stack = default_stack(&config, &routes, self.middleware)?;

        // 4. Run
        let service = stack.build(endpoint(router));
        let middleware: Vec<String> = stack.names().into_iter().map(str::to_string).collect();

        tracing::info!(
            routes = routes.len(),
            middleware = ?middleware,
            "Application booted"
        );

        Ok(Application {
            booted: Arc::new(Booted {
                config,
                container,
                routes,
                middleware,
            }),
            service,
        })
    }
}

/// Combined routes of every loaded slice plus the endpoint mounts.
fn build_route_table(
    deps: &Requirements<'_>,
    endpoints: &[RouteEntry],
) -> Result<RouteTable, ComponentError> {
    let mut table = RouteTable::new();
    // shape → (path, slice) of the first route with that shape
    let mut owners: HashMap<String, (String, String)> = HashMap::new();

    for name in deps.names() {
        let slice = deps.get_as::<LoadedSlice>(name)?;
        for route in &slice.routes {
            let shape = PathPattern::parse(&route.path)
                .map_err(|e| ComponentError::failed(ROUTES, e))?
                .shape();
            match owners.get(&shape) {
                Some((path, owner)) if *owner != slice.name => {
                    return Err(ComponentError::failed(
                        ROUTES,
                        format!(
                            "{} {} ({}) conflicts with {} ({})",
                            route.method, route.path, slice.name, path, owner
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    owners.insert(shape, (route.path.clone(), slice.name.clone()));
                }
            }
        }
        table.extend(slice.routes.iter().cloned());
    }
    table.extend(endpoints.iter().cloned());
    Ok(table)
}

/// Built-in middleware in boot order, then user middleware.
fn default_stack(
    config: &AppConfig,
    routes: &RouteTable,
    user: Vec<Placement>,
) -> Result<MiddlewareStack, MiddlewareError> {
    let mut stack = MiddlewareStack::new();

    if config.logger.enabled {
        stack.push(request_logger::middleware());
    }
    stack.push(content_length::middleware());
    if config.assets.serve {
        stack.push(static_assets::middleware(StaticAssets::from_config(&config.assets)));
    }
    if !config.environment.is_test() && routes.is_empty() {
        tracing::info!("No routes defined, serving the welcome page");
        stack.push(welcome::middleware());
    }
    stack.push(method_override::middleware(config.security.max_body_size));

    for placement in user {
        match placement {
            Placement::Append(middleware) => stack.push(middleware),
            Placement::Before(target, middleware) => stack.insert_before(&target, middleware)?,
            Placement::After(target, middleware) => stack.insert_after(&target, middleware)?,
        };
    }
    Ok(stack)
}
