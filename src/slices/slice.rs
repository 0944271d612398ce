//! Slice definition and loading.
//!
//! # Responsibilities
//! - Collect a slice's actions, views and routes
//! - Bind every action to its conventional view at load time
//! - Validate routes and build the slice's axum router
//!
//! # Design Decisions
//! - Action factories receive the slice's requirements, nothing else
//! - Route paths are relative to the slice prefix
//! - `LoadedSlice` is immutable; the router is cloned into the mount

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;

use crate::components::{Component, ComponentError, Requirements, Resolved};
use crate::rendering::naming::{camelize, qualify};
use crate::rendering::{RenderingPolicy, StatusPages, View, ViewBinding, ViewNaming, STATUS_PAGES};
use crate::routing::{MountPrefix, PathPattern, RouteEntry};
use crate::slices::action::{Action, ActionKey};
use crate::slices::dispatch::{BoundAction, Dispatch, SliceRuntime};
use crate::slices::{component_name, SliceError};

type ActionFactory =
    Arc<dyn Fn(&Requirements<'_>) -> Result<Arc<dyn Action>, ComponentError> + Send + Sync>;

struct ActionDef {
    key: String,
    class: Option<String>,
    factory: ActionFactory,
}

#[derive(Debug, Clone)]
struct RouteDef {
    method: Method,
    path: String,
    key: String,
    name: Option<String>,
}

/// A sub-application: actions, views and the routes reaching them.
pub struct Slice {
    name: String,
    namespace: String,
    prefix: MountPrefix,
    requires: Vec<String>,
    actions: Vec<ActionDef>,
    views: HashMap<String, Arc<dyn View>>,
    routes: Vec<RouteDef>,
}

/// Fluent construction of a [`Slice`].
pub struct SliceBuilder {
    slice: Slice,
}

impl Slice {
    /// Start a slice named `name`, namespaced `Name`, mounted at `/name`.
    pub fn builder(name: impl Into<String>) -> SliceBuilder {
        let name = name.into();
        SliceBuilder {
            slice: Slice {
                namespace: camelize(&name),
                prefix: MountPrefix::new(&name),
                name,
                requires: Vec::new(),
                actions: Vec::new(),
                views: HashMap::new(),
                routes: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn prefix(&self) -> &MountPrefix {
        &self.prefix
    }

    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Names of the registered views, fully qualified.
    pub fn view_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.views.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Wrap the slice as a component for the registry.
    pub fn into_component(self) -> SliceComponent {
        SliceComponent {
            slice: Arc::new(self),
        }
    }

    /// Build the runtime form of the slice.
    pub fn load(&self, deps: &Requirements<'_>) -> Result<LoadedSlice, SliceError> {
        let config = deps.config();
        let naming = ViewNaming::from_config(&config.rendering)?;
        let status_pages = deps.get_as::<StatusPages>(STATUS_PAGES)?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in config.security.headers() {
            let invalid = || SliceError::InvalidHeader {
                name: name.to_string(),
            };
            let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            default_headers.insert(HeaderName::from_static(name), value);
        }

        let runtime = Arc::new(SliceRuntime {
            slice: self.name.clone(),
            policy: RenderingPolicy::new(status_pages),
            default_headers,
            body_limit: config.security.max_body_size,
        });

        let mut actions = HashMap::new();
        let mut bindings = BTreeMap::new();
        for def in &self.actions {
            let key = ActionKey::parse(&def.key).ok_or_else(|| SliceError::InvalidActionKey {
                key: def.key.clone(),
            })?;
            let class = match &def.class {
                Some(class) => qualify(&self.namespace, class),
                None => naming.controller_name(&self.namespace, key.controller(), key.action()),
            };
            let view_name = naming.view_name(&self.namespace, &class)?;
            let binding = match self.views.get(&view_name) {
                Some(view) => ViewBinding::View {
                    name: view_name,
                    view: Arc::clone(view),
                },
                None => ViewBinding::Null {
                    attempted: view_name,
                },
            };
            tracing::debug!(
                slice = %self.name,
                action = %key,
                controller = %class,
                view = %binding.name(),
                bound = binding.is_bound(),
                "Action bound"
            );

            let action = (def.factory)(deps)?;
            bindings.insert(def.key.clone(), binding.clone());
            actions.insert(
                def.key.clone(),
                Arc::new(BoundAction {
                    key,
                    action,
                    binding,
                }),
            );
        }

        let mut paths: BTreeMap<String, MethodRouter> = BTreeMap::new();
        let mut shapes: HashMap<String, String> = HashMap::new();
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(self.routes.len());

        for route in &self.routes {
            let pattern = PathPattern::parse(&route.path)?;
            let target = actions
                .get(&route.key)
                .ok_or_else(|| SliceError::UnknownAction {
                    method: route.method.clone(),
                    path: route.path.clone(),
                    key: route.key.clone(),
                })?;

            let path = pattern.to_axum();
            if let Some(existing) = shapes.insert(pattern.shape(), path.clone()) {
                if existing != path {
                    return Err(SliceError::ConflictingPaths { path, existing });
                }
            }
            if !seen.insert((route.method.clone(), path.clone())) {
                return Err(SliceError::DuplicateRoute {
                    method: route.method.clone(),
                    path: route.path.clone(),
                });
            }
            let filter = MethodFilter::try_from(route.method.clone()).map_err(|_| {
                SliceError::UnsupportedMethod {
                    method: route.method.clone(),
                }
            })?;

            let dispatch = Dispatch {
                pattern: Arc::new(pattern),
                target: Arc::clone(target),
                runtime: Arc::clone(&runtime),
            };
            let handler = move |request: Request| dispatch.clone().call(request);

            let method_router = match paths.remove(&path) {
                Some(existing) => existing.on(filter, handler),
                None => axum::routing::on(filter, handler),
            };
            paths.insert(path, method_router);

            routes.push(RouteEntry {
                method: route.method.to_string(),
                path: self.prefix.join(&route.path),
                to: format!("{}: {}", self.name, route.key),
                name: route.name.clone(),
            });
        }

        let router = paths
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            });

        tracing::info!(
            slice = %self.name,
            prefix = %self.prefix,
            actions = actions.len(),
            routes = routes.len(),
            "Slice loaded"
        );

        Ok(LoadedSlice {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            prefix: self.prefix.clone(),
            router,
            routes,
            bindings,
        })
    }
}

impl SliceBuilder {
    /// Namespace view and controller names are qualified with.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.slice.namespace = namespace.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<MountPrefix>) -> Self {
        self.slice.prefix = prefix.into();
        self
    }

    /// Declare a component the slice's actions need.
    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.slice.requires.push(name.into());
        self
    }

    /// Register an action under `key` (`"books.index"`).
    pub fn action(self, key: impl Into<String>, action: impl Action) -> Self {
        let action: Arc<dyn Action> = Arc::new(action);
        self.push_action(
            key.into(),
            None,
            Arc::new(move |_: &Requirements<'_>| Ok(Arc::clone(&action))),
        )
    }

    /// Register an action built from the slice's requirements at load time.
    pub fn action_with<A, F>(self, key: impl Into<String>, factory: F) -> Self
    where
        A: Action,
        F: Fn(&Requirements<'_>) -> Result<A, ComponentError> + Send + Sync + 'static,
    {
        self.push_action(
            key.into(),
            None,
            Arc::new(move |deps: &Requirements<'_>| {
                Ok(Arc::new(factory(deps)?) as Arc<dyn Action>)
            }),
        )
    }

    /// Register an action whose controller class name is given explicitly.
    pub fn action_as(
        self,
        key: impl Into<String>,
        class: impl Into<String>,
        action: impl Action,
    ) -> Self {
        let action: Arc<dyn Action> = Arc::new(action);
        self.push_action(
            key.into(),
            Some(class.into()),
            Arc::new(move |_: &Requirements<'_>| Ok(Arc::clone(&action))),
        )
    }

    fn push_action(mut self, key: String, class: Option<String>, factory: ActionFactory) -> Self {
        self.slice.actions.retain(|def| def.key != key);
        self.slice.actions.push(ActionDef {
            key,
            class,
            factory,
        });
        self
    }

    /// Register a view. Relative names are qualified with the namespace.
    pub fn view(mut self, name: &str, view: impl View) -> Self {
        let name = qualify(&self.slice.namespace, name);
        self.slice.views.insert(name, Arc::new(view));
        self
    }

    pub fn route(mut self, method: Method, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.slice.routes.push(RouteDef {
            method,
            path: path.into(),
            key: key.into(),
            name: None,
        });
        self
    }

    pub fn get(self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.route(Method::GET, path, key)
    }

    pub fn post(self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.route(Method::POST, path, key)
    }

    pub fn put(self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.route(Method::PUT, path, key)
    }

    pub fn patch(self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.route(Method::PATCH, path, key)
    }

    pub fn delete(self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.route(Method::DELETE, path, key)
    }

    /// Name the most recently added route.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(route) = self.slice.routes.last_mut() {
            route.name = Some(name.into());
        }
        self
    }

    pub fn build(self) -> Slice {
        self.slice
    }
}

impl From<SliceBuilder> for Slice {
    fn from(builder: SliceBuilder) -> Self {
        builder.build()
    }
}

/// A slice registered in the component registry as `apps.<name>`.
#[derive(Clone)]
pub struct SliceComponent {
    slice: Arc<Slice>,
}

impl SliceComponent {
    pub fn name(&self) -> String {
        component_name(&self.slice.name)
    }

    pub fn slice(&self) -> &Slice {
        &self.slice
    }
}

impl Component for SliceComponent {
    fn requires(&self) -> Vec<String> {
        let mut requires = self.slice.requires.clone();
        if !requires.iter().any(|r| r == STATUS_PAGES) {
            requires.push(STATUS_PAGES.to_string());
        }
        requires
    }

    fn resolve(&self, deps: &Requirements<'_>) -> Result<Resolved, ComponentError> {
        match self.slice.load(deps) {
            Ok(loaded) => Ok(Arc::new(loaded)),
            Err(SliceError::Component(e)) => Err(e),
            Err(e) => Err(ComponentError::failed(self.name(), e)),
        }
    }
}

/// A slice after loading: its router and what it routes to.
#[derive(Clone)]
pub struct LoadedSlice {
    pub name: String,
    pub namespace: String,
    pub prefix: MountPrefix,
    pub router: Router,
    pub routes: Vec<RouteEntry>,
    /// View binding per action key.
    pub bindings: BTreeMap<String, ViewBinding>,
}

impl std::fmt::Debug for LoadedSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedSlice")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .field("bindings", &self.bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Registry;
    use crate::config::{AppConfig, Environment};
    use crate::rendering::view_fn;
    use crate::slices::action::{action_fn, ActionError};
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    use axum::http::Request;

    fn registry() -> Registry {
        let registry = Registry::new(Arc::new(AppConfig::for_environment(Environment::Test)));
        registry.register_fn(STATUS_PAGES, Vec::<String>::new(), |_| {
            Ok(Arc::new(StatusPages::builtin()) as Resolved)
        });
        registry
    }

    fn load(slice: SliceBuilder) -> Result<LoadedSlice, ComponentError> {
        let registry = registry();
        let component = slice.build().into_component();
        let name = component.name();
        registry.register(name.clone(), component);
        registry.resolve([name.as_str()])?;
        registry.get_as::<LoadedSlice>(&name).map(|s| (*s).clone())
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn books() -> SliceBuilder {
        Slice::builder("web")
            .action(
                "books.index",
                action_fn(|_, res| res.expose("title", "All books")),
            )
            .action(
                "books.show",
                action_fn(|req, res| {
                    let id = req.param("id").unwrap_or_default().to_string();
                    res.set_body(format!("book {id}"));
                    Ok(())
                }),
            )
            .action(
                "books.missing",
                action_fn(|_, _| Err(ActionError::halt(StatusCode::NOT_FOUND))),
            )
            .view(
                "Views::Books::Index",
                view_fn(|ctx| Ok(format!("<h1>{}</h1>", ctx.str("title").unwrap_or_default()))),
            )
            .get("/books", "books.index")
            .named("books")
            .get("/books/:id", "books.show")
            .get("/gone", "books.missing")
    }

    #[tokio::test]
    async fn test_bound_view_renders() {
        let slice = load(books()).unwrap();
        assert!(slice.bindings["books.index"].is_bound());
        assert_eq!(slice.bindings["books.index"].name(), "Web::Views::Books::Index");

        let (status, headers, body) = send(slice.router, get("/books")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>All books</h1>");
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_unbound_action_keeps_its_body() {
        let slice = load(books()).unwrap();
        assert!(!slice.bindings["books.show"].is_bound());

        let (status, _, body) = send(slice.router, get("/books/42")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "book 42");
    }

    #[tokio::test]
    async fn test_halt_renders_status_page() {
        let slice = load(books()).unwrap();
        let (status, headers, body) = send(slice.router, get("/gone")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("404 Not Found"));
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_json_request_skips_view() {
        let slice = load(books()).unwrap();
        let request = Request::builder()
            .uri("/books")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(slice.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected() {
        let mut config = AppConfig::for_environment(Environment::Test);
        config.security.max_body_size = 4;
        let registry = Registry::new(Arc::new(config));
        registry.register_fn(STATUS_PAGES, Vec::<String>::new(), |_| {
            Ok(Arc::new(StatusPages::builtin()) as Resolved)
        });
        let slice = Slice::builder("web")
            .action("uploads.create", action_fn(|_, _| Ok(())))
            .post("/uploads", "uploads.create")
            .build();
        registry.register("apps.web", slice.into_component());
        registry.resolve(["apps.web"]).unwrap();
        let loaded = registry.get_as::<LoadedSlice>("apps.web").unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/uploads")
            .body(Body::from("far too long"))
            .unwrap();
        let (status, _, _) = send(loaded.router.clone(), request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_route_entries_include_prefix_and_name() {
        let slice = load(books().prefix("/shelf")).unwrap();
        assert_eq!(slice.routes[0].path, "/shelf/books");
        assert_eq!(slice.routes[0].to, "web: books.index");
        assert_eq!(slice.routes[0].name.as_deref(), Some("books"));
        assert_eq!(slice.routes[1].path, "/shelf/books/:id");
    }

    #[test]
    fn test_unknown_action_fails_load() {
        let err = load(Slice::builder("web").get("/", "home.index")).unwrap_err();
        assert!(err.to_string().contains("home.index"));
    }

    #[test]
    fn test_conflicting_and_duplicate_routes_fail_load() {
        let noop = || action_fn(|_, _| Ok(()));
        let conflict = Slice::builder("web")
            .action("books.show", noop())
            .get("/books/:id", "books.show")
            .post("/books/:book_id", "books.show");
        assert!(load(conflict).unwrap_err().to_string().contains("conflicts"));

        let duplicate = Slice::builder("web")
            .action("books.show", noop())
            .get("/books/:id", "books.show")
            .get("/books/:id", "books.show");
        assert!(load(duplicate).unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_explicit_class_must_match_pattern() {
        let slice = Slice::builder("web").action_as(
            "books.index",
            "Handlers::Books::Index",
            action_fn(|_, _| Ok(())),
        );
        let err = load(slice).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_factory_sees_declared_requirements() {
        let registry = registry();
        registry.register_fn("greeting", Vec::<String>::new(), |_| {
            Ok(Arc::new("hello".to_string()) as Resolved)
        });
        let slice = Slice::builder("web")
            .requires("greeting")
            .action_with("home.index", |deps| {
                let greeting = deps.get_as::<String>("greeting")?;
                Ok(action_fn(move |_, res| {
                    res.set_body(greeting.as_str().to_owned());
                    Ok(())
                }))
            })
            .get("/", "home.index")
            .build();
        registry.register("apps.web", slice.into_component());

        registry.resolve(["apps.web"]).unwrap();
        assert!(registry.is_resolved("greeting"));
        assert!(registry.is_resolved(STATUS_PAGES));
    }
}
