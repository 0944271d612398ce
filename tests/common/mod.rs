//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use hanami::config::{AppConfig, Environment};
use hanami::{Application, Shutdown};

/// Configuration for `environment` with request logging off.
pub fn config(environment: Environment) -> AppConfig {
    let mut config = AppConfig::for_environment(environment);
    config.logger.enabled = false;
    config
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Send `request` through the application in-process.
pub async fn send(app: &Application, request: Request<Body>) -> TestResponse {
    let response = app.call(request).await;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).to_string(),
    }
}

pub async fn get(app: &Application, uri: &str) -> TestResponse {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

/// POST an urlencoded form.
pub async fn post_form(app: &Application, uri: &str, form: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn(app: Application) -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.signalled();
    let handle = tokio::spawn(app.serve(listener, signal));
    (addr, shutdown, handle)
}
