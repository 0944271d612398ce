//! Middleware stack.
//!
//! # Responsibilities
//! - Keep an ordered, named list of request wrappers
//! - Allow inserting around an existing entry by name
//! - Compose the list around an inner service, once, at boot
//!
//! # Design Decisions
//! - The first entry is the outermost wrapper
//! - Every entry maps an `Endpoint` to an `Endpoint`, so any tower layer fits
//! - The stack wraps the composed router as a service, so entries run
//!   before routing (method override must change the method the router sees)
//!
//! # Data Flow
//! ```text
//! Request → request_logger → content_length → static_assets
//!         → welcome → method_override → user layers → router
//! ```

pub mod content_length;
pub mod method_override;
pub mod request_logger;
pub mod static_assets;
pub mod welcome;

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service, ServiceExt};

/// The host contract: a cloneable service turning requests into responses.
pub type Endpoint = BoxCloneSyncService<Request, Response, Infallible>;

/// Box any infallible service into an [`Endpoint`].
pub fn endpoint<S>(service: S) -> Endpoint
where
    S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(service.map_response(IntoResponse::into_response))
}

type Wrap = Arc<dyn Fn(Endpoint) -> Endpoint + Send + Sync>;

/// A named request wrapper.
#[derive(Clone)]
pub struct Middleware {
    name: String,
    wrap: Wrap,
}

impl Middleware {
    pub fn new<F>(name: impl Into<String>, wrap: F) -> Self
    where
        F: Fn(Endpoint) -> Endpoint + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            wrap: Arc::new(wrap),
        }
    }

    /// Wrap with a tower layer.
    pub fn layer<L>(name: impl Into<String>, layer: L) -> Self
    where
        L: Layer<Endpoint> + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        Self::new(name, move |inner| endpoint(layer.layer(inner)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, inner: Endpoint) -> Endpoint {
        (self.wrap)(inner)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

#[derive(Debug, Error)]
pub enum MiddlewareError {
    #[error("No middleware named {name:?} in the stack")]
    NotFound { name: String },
}

/// Ordered middleware, outermost first.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareStack {
    entries: Vec<Middleware>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Middleware) -> &mut Self {
        tracing::debug!(middleware = %middleware.name, "Middleware appended");
        self.entries.push(middleware);
        self
    }

    pub fn insert_before(
        &mut self,
        target: &str,
        middleware: Middleware,
    ) -> Result<&mut Self, MiddlewareError> {
        let index = self.position(target)?;
        self.entries.insert(index, middleware);
        Ok(self)
    }

    pub fn insert_after(
        &mut self,
        target: &str,
        middleware: Middleware,
    ) -> Result<&mut Self, MiddlewareError> {
        let index = self.position(target)?;
        self.entries.insert(index + 1, middleware);
        Ok(self)
    }

    fn position(&self, target: &str) -> Result<usize, MiddlewareError> {
        self.entries
            .iter()
            .position(|m| m.name == target)
            .ok_or_else(|| MiddlewareError::NotFound {
                name: target.to_string(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wrap `inner`; the first entry ends up outermost.
    pub fn build(&self, inner: Endpoint) -> Endpoint {
        self.entries
            .iter()
            .rev()
            .fold(inner, |service, middleware| middleware.apply(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};

    /// Appends its name to the `x-trail` response header.
    fn tag(name: &'static str) -> Middleware {
        Middleware::new(name, move |inner: Endpoint| {
            endpoint(tower::service_fn(move |request: Request| {
                let inner = inner.clone();
                async move {
                    let mut response = inner.oneshot(request).await?;
                    let trail = match response.headers().get("x-trail") {
                        Some(v) => format!("{},{name}", v.to_str().unwrap_or_default()),
                        None => name.to_string(),
                    };
                    response
                        .headers_mut()
                        .insert("x-trail", HeaderValue::from_str(&trail).unwrap());
                    Ok::<_, Infallible>(response)
                }
            }))
        })
    }

    fn ok() -> Endpoint {
        endpoint(tower::service_fn(|_: Request| async {
            Ok::<_, Infallible>(StatusCode::OK.into_response())
        }))
    }

    async fn trail(stack: &MiddlewareStack) -> String {
        let response = stack
            .build(ok())
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        response.headers()["x-trail"].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_first_entry_is_outermost() {
        let mut stack = MiddlewareStack::new();
        stack.push(tag("outer")).push(tag("inner"));
        // Responses unwind innermost first.
        assert_eq!(trail(&stack).await, "inner,outer");
    }

    #[tokio::test]
    async fn test_insert_before_and_after() {
        let mut stack = MiddlewareStack::new();
        stack.push(tag("a")).push(tag("c"));
        stack.insert_before("c", tag("b")).unwrap();
        stack.insert_after("c", tag("d")).unwrap();
        assert_eq!(stack.names(), vec!["a", "b", "c", "d"]);
        assert_eq!(trail(&stack).await, "d,c,b,a");

        assert!(matches!(
            stack.insert_before("missing", tag("x")),
            Err(MiddlewareError::NotFound { .. })
        ));
    }
}
