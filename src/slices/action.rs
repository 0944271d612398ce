//! Actions: the request handlers a slice routes to.
//!
//! # Responsibilities
//! - Define the `Action` contract and its request/response types
//! - Negotiate the response format from `Accept`
//! - Carry exposures (data handed to the view)
//!
//! # Design Decisions
//! - Actions are synchronous; the server provides concurrency
//! - Params merge query, form and path values (path wins)
//! - `halt` is an error variant so `?` can stop an action early

use std::collections::HashMap;
use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::middleware::method_override::OriginalMethod;

/// Data an action hands to its view.
pub type Exposures = serde_json::Map<String, serde_json::Value>;

/// Request parameters by name.
pub type Params = HashMap<String, String>;

/// Identifies an action inside a slice: `books.index`, `admin.users.show`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey {
    controller: String,
    action: String,
}

impl ActionKey {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Parse `controller.action`; the last dot separates the action.
    pub fn parse(key: &str) -> Option<Self> {
        let (controller, action) = key.rsplit_once('.')?;
        (!controller.is_empty() && !action.is_empty()).then(|| Self::new(controller, action))
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.controller, self.action)
    }
}

/// Response format negotiated from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
    Text,
    /// `*/*` or no `Accept` header.
    All,
    /// Any other media type.
    Other(String),
}

impl Format {
    /// Format of the first media range in an `Accept` header.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let first = accept
            .and_then(|a| a.split(',').next())
            .and_then(|range| range.split(';').next())
            .map(|mime| mime.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match first.as_str() {
            "" | "*/*" => Format::All,
            "text/html" | "application/xhtml+xml" => Format::Html,
            "application/json" => Format::Json,
            "text/plain" => Format::Text,
            other => Format::Other(other.to_string()),
        }
    }

    /// Formats the rendering policy renders views and status pages for.
    pub fn is_renderable(&self) -> bool {
        matches!(self, Format::Html | Format::All)
    }

    pub fn content_type(&self) -> &str {
        match self {
            Format::Html | Format::All => "text/html; charset=utf-8",
            Format::Json => "application/json",
            Format::Text => "text/plain; charset=utf-8",
            Format::Other(mime) => mime,
        }
    }
}

/// Errors an action can return.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Stop processing and respond with this status.
    #[error("Halted with {0}")]
    Halt(StatusCode),

    #[error("Invalid header {name}")]
    InvalidHeader { name: String },

    #[error("Exposure {key:?} could not be serialized: {source}")]
    Exposure {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Action failed: {0}")]
    Failed(String),
}

impl ActionError {
    pub fn halt(status: StatusCode) -> Self {
        Self::Halt(status)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        match self {
            ActionError::Halt(status) => status.into_response(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        }
    }
}

/// A request as an action sees it.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    method: Method,
    original_method: Option<Method>,
    uri: Uri,
    headers: HeaderMap,
    params: Params,
    body: Bytes,
}

impl ActionRequest {
    /// Build from request parts, path params and the buffered body.
    pub fn new(parts: Parts, path_params: Params, body: Bytes) -> Self {
        let mut params = Params::new();
        if let Some(query) = parts.uri.query() {
            params.extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
        }
        if is_form(&parts.headers) {
            params.extend(url::form_urlencoded::parse(&body).into_owned());
        }
        params.extend(path_params);

        let original_method = parts
            .extensions
            .get::<OriginalMethod>()
            .map(|m| m.0.clone());

        Self {
            method: parts.method,
            original_method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Method before a method override, if one applied.
    pub fn original_method(&self) -> Option<&Method> {
        self.original_method.as_ref()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// The response an action builds.
#[derive(Debug)]
pub struct ActionResponse {
    status: StatusCode,
    format: Format,
    headers: HeaderMap,
    body: Bytes,
    exposures: Exposures,
    redirect: bool,
}

impl ActionResponse {
    pub fn new(format: Format) -> Self {
        Self {
            status: StatusCode::OK,
            format,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            exposures: Exposures::new(),
            redirect: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ActionError> {
        let invalid = || ActionError::InvalidHeader {
            name: name.to_string(),
        };
        let name = HeaderName::try_from(name).map_err(|_| invalid())?;
        let value = HeaderValue::try_from(value).map_err(|_| invalid())?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub(crate) fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body)
    }

    /// Hand `value` to the view under `key`.
    pub fn expose(&mut self, key: &str, value: impl Serialize) -> Result<(), ActionError> {
        let value = serde_json::to_value(value).map_err(|source| ActionError::Exposure {
            key: key.to_string(),
            source,
        })?;
        self.exposures.insert(key.to_string(), value);
        Ok(())
    }

    pub fn exposures(&self) -> &Exposures {
        &self.exposures
    }

    pub fn redirect_to(&mut self, location: &str, status: StatusCode) -> Result<(), ActionError> {
        let value = HeaderValue::try_from(location).map_err(|_| ActionError::InvalidHeader {
            name: header::LOCATION.to_string(),
        })?;
        self.headers.insert(header::LOCATION, value);
        self.status = status;
        self.redirect = true;
        Ok(())
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect
    }

    /// Convert into an HTTP response, adding a content type when a body is set.
    pub fn finish(mut self) -> Response {
        if !self.body.is_empty() && !self.headers.contains_key(header::CONTENT_TYPE) {
            if let Ok(value) = HeaderValue::from_str(self.format.content_type()) {
                self.headers.insert(header::CONTENT_TYPE, value);
            }
        }
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// A request handler inside a slice.
pub trait Action: Send + Sync + 'static {
    fn call(&self, request: &ActionRequest, response: &mut ActionResponse) -> Result<(), ActionError>;
}

/// An action backed by a closure, see [`action_fn`].
pub struct FnAction<F> {
    call: F,
}

/// Build an action from a closure.
pub fn action_fn<F>(call: F) -> FnAction<F>
where
    F: Fn(&ActionRequest, &mut ActionResponse) -> Result<(), ActionError> + Send + Sync + 'static,
{
    FnAction { call }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&ActionRequest, &mut ActionResponse) -> Result<(), ActionError> + Send + Sync + 'static,
{
    fn call(&self, request: &ActionRequest, response: &mut ActionResponse) -> Result<(), ActionError> {
        (self.call)(request, response)
    }
}
