//! Content-Length enforcement.
//!
//! Adds `Content-Length` to responses whose size is known exactly, unless
//! the response already declares a length, uses `Transfer-Encoding`, or has
//! a status that forbids a body.

use axum::body::HttpBody;
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::middleware::Middleware;

pub const NAME: &str = "content_length";

pub async fn content_length(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers();
    if headers.contains_key(header::CONTENT_LENGTH)
        || headers.contains_key(header::TRANSFER_ENCODING)
        || !permits_body(response.status())
    {
        return response;
    }

    if let Some(length) = response.body().size_hint().exact() {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    response
}

fn permits_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

pub fn middleware() -> Middleware {
    Middleware::layer(NAME, axum::middleware::from_fn(content_length))
}
