//! HTTP method override.
//!
//! # Responsibilities
//! - Let POST requests ask for another method, via the
//!   `X-HTTP-Method-Override` header or a `_method` form field
//! - Remember the method the client actually sent
//!
//! # Design Decisions
//! - Only POST is overridden; the header wins over the form field
//! - Form bodies are buffered (bounded by the body limit) and replayed
//! - Unknown methods leave the request untouched

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::middleware::Middleware;

pub const NAME: &str = "method_override";

pub const OVERRIDE_HEADER: &str = "x-http-method-override";

pub const OVERRIDE_PARAM: &str = "_method";

const ALLOWED: [&str; 9] = [
    "GET", "HEAD", "PUT", "POST", "DELETE", "OPTIONS", "PATCH", "LINK", "UNLINK",
];

/// The method a request arrived with before an override replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalMethod(pub Method);

fn allowed(candidate: &str) -> Option<Method> {
    let upper = candidate.trim().to_ascii_uppercase();
    if !ALLOWED.contains(&upper.as_str()) {
        return None;
    }
    Method::from_bytes(upper.as_bytes()).ok()
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

pub async fn method_override(
    State(body_limit): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    if *request.method() != Method::POST {
        return next.run(request).await;
    }

    let from_header = request
        .headers()
        .get(OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (mut request, requested) = match from_header {
        Some(value) => (request, Some(value)),
        None if is_form(request.headers()) => {
            let (parts, body) = request.into_parts();
            let bytes = match axum::body::to_bytes(body, body_limit).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, limit = body_limit, "Form body rejected");
                    return StatusCode::PAYLOAD_TOO_LARGE.into_response();
                }
            };
            let requested = url::form_urlencoded::parse(&bytes)
                .find(|(key, _)| key == OVERRIDE_PARAM)
                .map(|(_, value)| value.into_owned());
            (Request::from_parts(parts, Body::from(bytes)), requested)
        }
        None => (request, None),
    };

    if let Some(method) = requested.as_deref().and_then(allowed) {
        if method != Method::POST {
            tracing::debug!(
                path = %request.uri().path(),
                method = %method,
                "Method overridden"
            );
            let original = request.method().clone();
            request.extensions_mut().insert(OriginalMethod(original));
            *request.method_mut() = method;
        }
    }

    next.run(request).await
}

pub fn middleware(body_limit: usize) -> Middleware {
    Middleware::layer(
        NAME,
        axum::middleware::from_fn_with_state(body_limit, method_override),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{endpoint, Endpoint, MiddlewareStack};
    use std::convert::Infallible;
    use tower::ServiceExt;

    /// Echoes `<method> <original method> <body>`.
    fn app() -> Endpoint {
        let mut stack = MiddlewareStack::new();
        stack.push(middleware(1024));
        stack.build(endpoint(tower::service_fn(|request: Request| async move {
            let method = request.method().to_string();
            let original = request
                .extensions()
                .get::<OriginalMethod>()
                .map(|m| m.0.to_string())
                .unwrap_or_else(|| "-".to_string());
            let body = axum::body::to_bytes(request.into_body(), usize::MAX)
                .await
                .unwrap_or_default();
            let text = format!("{method} {original} {}", String::from_utf8_lossy(&body));
            Ok::<_, Infallible>(text.into_response())
        })))
    }

    async fn send(request: Request) -> String {
        let response = app().oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn post(content_type: Option<&str>, override_to: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method(Method::POST).uri("/books/1");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        if let Some(method) = override_to {
            builder = builder.header(OVERRIDE_HEADER, method);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_form_field_overrides_and_body_is_replayed() {
        let echoed = send(post(
            Some("application/x-www-form-urlencoded"),
            None,
            "_method=delete&title=x",
        ))
        .await;
        assert_eq!(echoed, "DELETE POST _method=delete&title=x");
    }

    #[tokio::test]
    async fn test_header_overrides() {
        assert_eq!(send(post(None, Some("patch"), "")).await, "PATCH POST ");
    }

    #[tokio::test]
    async fn test_unknown_method_is_ignored() {
        assert_eq!(send(post(None, Some("TRACE"), "")).await, "POST - ");
    }

    #[tokio::test]
    async fn test_only_post_is_overridden() {
        let request = axum::http::Request::builder()
            .method(Method::GET)
            .header(OVERRIDE_HEADER, "DELETE")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await, "GET - ");
    }
}
