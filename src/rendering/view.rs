//! Views and their boot-time bindings.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::rendering::RenderError;
use crate::slices::action::{Exposures, Format};

/// What a view sees when it renders.
pub struct RenderContext<'a> {
    pub exposures: &'a Exposures,
    pub format: &'a Format,
    pub status: StatusCode,
}

impl RenderContext<'_> {
    /// An exposure as a string, when it is one.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.exposures.get(key).and_then(|v| v.as_str())
    }
}

/// Turns an action's exposures into a response body.
pub trait View: Send + Sync + 'static {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError>;

    /// Content type set when the action did not choose one.
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

/// A view backed by a closure, see [`view_fn`].
pub struct FnView<F> {
    render: F,
}

/// Build a view from a closure.
pub fn view_fn<F>(render: F) -> FnView<F>
where
    F: Fn(&RenderContext<'_>) -> Result<String, RenderError> + Send + Sync + 'static,
{
    FnView { render }
}

impl<F> View for FnView<F>
where
    F: Fn(&RenderContext<'_>) -> Result<String, RenderError> + Send + Sync + 'static,
{
    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        (self.render)(ctx)
    }
}

/// Pass-through view wrapping a body the action already set.
pub struct NullView {
    body: Bytes,
}

impl NullView {
    pub fn new(body: Bytes) -> Self {
        Self { body }
    }

    /// The wrapped body, `None` when empty.
    pub fn render(self) -> Option<Bytes> {
        (!self.body.is_empty()).then_some(self.body)
    }
}

/// The view an action was paired with at boot.
#[derive(Clone)]
pub enum ViewBinding {
    /// A registered view matched the derived name.
    View { name: String, view: Arc<dyn View> },
    /// Nothing is registered under the derived name.
    Null { attempted: String },
}

impl ViewBinding {
    pub fn name(&self) -> &str {
        match self {
            ViewBinding::View { name, .. } => name,
            ViewBinding::Null { attempted } => attempted,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, ViewBinding::View { .. })
    }
}

impl std::fmt::Debug for ViewBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewBinding::View { name, .. } => f.debug_tuple("View").field(name).finish(),
            ViewBinding::Null { attempted } => f.debug_tuple("Null").field(attempted).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_view_wraps_body() {
        assert_eq!(NullView::new(Bytes::from("hi")).render(), Some(Bytes::from("hi")));
        assert_eq!(NullView::new(Bytes::new()).render(), None);
    }

    #[test]
    fn test_closure_view() {
        let view = view_fn(|ctx| Ok(format!("<h1>{}</h1>", ctx.str("title").unwrap_or(""))));
        let mut exposures = Exposures::new();
        exposures.insert("title".into(), "Books".into());
        let ctx = RenderContext {
            exposures: &exposures,
            format: &Format::Html,
            status: StatusCode::OK,
        };
        assert_eq!(view.render(&ctx).unwrap(), "<h1>Books</h1>");
    }
}
