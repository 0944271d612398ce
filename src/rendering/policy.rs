//! Rendering policy.
//!
//! # Responsibilities
//! - Decide whether a dispatched action still needs a body
//! - Render the view bound to the action, or pass its own body through
//! - Fall back to a status page for unsuccessful HTML responses
//!
//! # Design Decisions
//! - Only 200 and 201 count as successful for status-page purposes
//! - Redirects and statuses that forbid a body are never rendered
//! - View failures are returned to the caller, not translated here

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

use crate::rendering::status::StatusPages;
use crate::rendering::view::{NullView, RenderContext, ViewBinding};
use crate::rendering::RenderError;
use crate::slices::action::ActionResponse;

const HTML: &str = "text/html; charset=utf-8";

/// Chooses and runs the view for a dispatched action.
#[derive(Clone, Default)]
pub struct RenderingPolicy {
    status_pages: Arc<StatusPages>,
}

impl RenderingPolicy {
    pub fn new(status_pages: Arc<StatusPages>) -> Self {
        Self { status_pages }
    }

    pub fn status_pages(&self) -> &StatusPages {
        &self.status_pages
    }

    /// Turn an action's response into the final HTTP response.
    pub fn render(
        &self,
        binding: &ViewBinding,
        mut response: ActionResponse,
    ) -> Result<Response, RenderError> {
        let status = response.status();
        if response.is_redirect() || !permits_body(status) {
            return Ok(response.finish());
        }

        let renderable = response.format().is_renderable();

        if renderable && response.body().is_empty() {
            match binding {
                ViewBinding::View { name, view } => {
                    let body = {
                        let ctx = RenderContext {
                            exposures: response.exposures(),
                            format: response.format(),
                            status,
                        };
                        view.render(&ctx).map_err(|e| e.in_view(name))?
                    };
                    tracing::trace!(view = %name, "View rendered");
                    set_content_type(&mut response, view.content_type());
                    response.set_body(body);
                }
                ViewBinding::Null { .. } => {
                    if let Some(body) = NullView::new(response.take_body()).render() {
                        response.set_body(body);
                    }
                }
            }
        }

        if response.body().is_empty() && renderable && !is_successful(status) {
            let page = self.status_pages.render(status);
            set_content_type(&mut response, HTML);
            response.set_body(page);
        }

        Ok(response.finish())
    }
}

fn set_content_type(response: &mut ActionResponse, value: &'static str) {
    response
        .headers_mut()
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(value));
}

fn is_successful(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201)
}

fn permits_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::view::{view_fn, View};
    use crate::slices::action::Format;

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn bound(view: impl View) -> ViewBinding {
        ViewBinding::View {
            name: "Web::Views::Books::Index".into(),
            view: Arc::new(view),
        }
    }

    fn null() -> ViewBinding {
        ViewBinding::Null {
            attempted: "Web::Views::Books::Index".into(),
        }
    }

    #[tokio::test]
    async fn test_view_renders_exposures() {
        let policy = RenderingPolicy::default();
        let mut response = ActionResponse::new(Format::Html);
        response.expose("title", "Books").unwrap();

        let view = view_fn(|ctx| Ok(format!("<h1>{}</h1>", ctx.str("title").unwrap_or_default())));
        let rendered = policy.render(&bound(view), response).unwrap();
        assert_eq!(rendered.status(), StatusCode::OK);
        assert_eq!(rendered.headers()[header::CONTENT_TYPE], HTML);
        assert_eq!(body(rendered).await, "<h1>Books</h1>");
    }

    #[tokio::test]
    async fn test_explicit_body_wins_over_view() {
        let policy = RenderingPolicy::default();
        let mut response = ActionResponse::new(Format::Html);
        response.set_body("already set");
        let view = view_fn(|_| Ok("from view".to_string()));

        let rendered = policy.render(&bound(view), response).unwrap();
        assert_eq!(body(rendered).await, "already set");
    }

    #[tokio::test]
    async fn test_null_view_keeps_existing_body() {
        let policy = RenderingPolicy::default();
        let mut response = ActionResponse::new(Format::All);
        response.set_body("plain");
        assert_eq!(body(policy.render(&null(), response).unwrap()).await, "plain");

        let empty = ActionResponse::new(Format::Html);
        assert_eq!(body(policy.render(&null(), empty).unwrap()).await, "");
    }

    #[tokio::test]
    async fn test_status_page_for_unsuccessful_html() {
        let policy = RenderingPolicy::default();
        let mut response = ActionResponse::new(Format::Html);
        response.set_status(StatusCode::NOT_FOUND);

        let rendered = policy.render(&null(), response).unwrap();
        assert_eq!(rendered.status(), StatusCode::NOT_FOUND);
        assert!(body(rendered).await.contains("404 Not Found"));
    }

    #[tokio::test]
    async fn test_no_status_page_for_json_or_success() {
        let policy = RenderingPolicy::default();
        let mut json = ActionResponse::new(Format::Json);
        json.set_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body(policy.render(&null(), json).unwrap()).await, "");

        let accepted = {
            let mut r = ActionResponse::new(Format::Html);
            r.set_status(StatusCode::ACCEPTED);
            r
        };
        assert!(body(policy.render(&null(), accepted).unwrap()).await.contains("202"));

        let created = {
            let mut r = ActionResponse::new(Format::Html);
            r.set_status(StatusCode::CREATED);
            r
        };
        assert_eq!(body(policy.render(&null(), created).unwrap()).await, "");
    }

    #[tokio::test]
    async fn test_bodyless_statuses_and_redirects_pass_through() {
        let policy = RenderingPolicy::default();
        let view = view_fn(|_| Ok("never".to_string()));

        let mut no_content = ActionResponse::new(Format::Html);
        no_content.set_status(StatusCode::NO_CONTENT);
        assert_eq!(body(policy.render(&bound(view), no_content).unwrap()).await, "");

        let mut redirect = ActionResponse::new(Format::Html);
        redirect.redirect_to("/books", StatusCode::FOUND).unwrap();
        let rendered = policy.render(&null(), redirect).unwrap();
        assert_eq!(rendered.headers()[header::LOCATION], "/books");
        assert_eq!(body(rendered).await, "");
    }

    #[tokio::test]
    async fn test_view_error_names_view() {
        let policy = RenderingPolicy::default();
        let view = view_fn(|_| Err(RenderError::failed("template missing")));
        let err = policy
            .render(&bound(view), ActionResponse::new(Format::Html))
            .unwrap_err();
        assert!(err.to_string().contains("Web::Views::Books::Index"));
    }
}
