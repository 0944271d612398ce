//! First-run welcome page.
//!
//! Installed only outside the test environment and only when the
//! application has no routes and no mounts. It answers every request.

use std::convert::Infallible;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::middleware::{endpoint, Middleware};

pub const NAME: &str = "welcome";

const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Hanami | Welcome</title>
  </head>
  <body>
    <h1>Welcome to Hanami</h1>
    <p>This application has no routes yet. Define a slice with routes to replace this page.</p>
  </body>
</html>
"#;

pub fn page() -> Response {
    (StatusCode::OK, Html(PAGE)).into_response()
}

pub fn middleware() -> Middleware {
    Middleware::new(NAME, |_inner| {
        endpoint(tower::service_fn(|_: Request| async {
            Ok::<_, Infallible>(page())
        }))
    })
}
