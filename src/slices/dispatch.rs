//! Per-route request dispatch.
//!
//! One `Dispatch` is built for every route at load time. It buffers the
//! body, builds the action's request and response, calls the action and
//! hands the result to the rendering policy.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::rendering::{RenderingPolicy, ViewBinding};
use crate::routing::PathPattern;
use crate::slices::action::{Action, ActionError, ActionKey, ActionRequest, ActionResponse, Format};

/// An action together with the view it was bound to.
pub(crate) struct BoundAction {
    pub key: ActionKey,
    pub action: Arc<dyn Action>,
    pub binding: ViewBinding,
}

/// Settings shared by every route of a slice.
pub(crate) struct SliceRuntime {
    pub slice: String,
    pub policy: RenderingPolicy,
    pub default_headers: HeaderMap,
    pub body_limit: usize,
}

#[derive(Clone)]
pub(crate) struct Dispatch {
    pub pattern: Arc<PathPattern>,
    pub target: Arc<BoundAction>,
    pub runtime: Arc<SliceRuntime>,
}

impl Dispatch {
    pub async fn call(self, request: Request) -> Response {
        let (parts, body) = request.into_parts();

        let body = match axum::body::to_bytes(body, self.runtime.body_limit).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    slice = %self.runtime.slice,
                    action = %self.target.key,
                    limit = self.runtime.body_limit,
                    error = %e,
                    "Request body rejected"
                );
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
        };

        let params = self.pattern.captures(parts.uri.path()).unwrap_or_default();
        let format = Format::from_accept(
            parts
                .headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok()),
        );

        let request = ActionRequest::new(parts, params, body);
        let mut response = ActionResponse::new(format);
        response
            .headers_mut()
            .extend(self.runtime.default_headers.clone());

        let mut halted = None;
        match self.target.action.call(&request, &mut response) {
            Ok(()) => {}
            Err(ActionError::Halt(status)) => {
                tracing::debug!(action = %self.target.key, status = %status, "Action halted");
                response.set_status(status);
                // A halted action never reaches its view.
                halted = Some(ViewBinding::Null {
                    attempted: self.target.binding.name().to_string(),
                });
            }
            Err(e) => {
                tracing::error!(
                    slice = %self.runtime.slice,
                    action = %self.target.key,
                    error = %e,
                    "Action failed"
                );
                return e.into_response();
            }
        }

        let binding = halted.as_ref().unwrap_or(&self.target.binding);
        match self.runtime.policy.render(binding, response) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    slice = %self.runtime.slice,
                    action = %self.target.key,
                    view = %self.target.binding.name(),
                    error = %e,
                    "Render failed"
                );
                e.into_response()
            }
        }
    }
}
