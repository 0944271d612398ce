//! Static asset serving.
//!
//! # Responsibilities
//! - Serve GET/HEAD requests under the configured URL prefixes from disk
//! - Reject paths that try to leave the asset root
//! - Pass everything else, including missing files, to the next service
//!
//! # Design Decisions
//! - File responses come from `tower_http::services::ServeFile`
//!   (content type, ranges, conditional requests)
//! - Prefixes match on segment boundaries: `/assets` does not match `/assetsx`

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::config::AssetsConfig;
use crate::middleware::Middleware;
use crate::routing::MountPrefix;

pub const NAME: &str = "static_assets";

/// Where assets live and which URLs reach them.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
    prefixes: Vec<MountPrefix>,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>, prefixes: impl IntoIterator<Item = MountPrefix>) -> Self {
        Self {
            root: root.into(),
            prefixes: prefixes.into_iter().collect(),
        }
    }

    pub fn from_config(config: &AssetsConfig) -> Self {
        Self::new(
            config.root.clone(),
            config.prefixes.iter().map(MountPrefix::new),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn handles(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| prefix.matches(path))
    }
}

/// File under `root` for a URL path, `None` when it escapes the root.
fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    let mut file = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => file.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(file)
}

pub async fn static_assets(
    State(assets): State<Arc<StaticAssets>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !matches!(*request.method(), Method::GET | Method::HEAD) || !assets.handles(path) {
        return next.run(request).await;
    }

    let file = match resolve(&assets.root, path) {
        Some(file) => file,
        None => {
            tracing::warn!(path = %path, "Asset path escapes the asset root");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    let is_file = tokio::fs::metadata(&file)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return next.run(request).await;
    }

    tracing::debug!(file = %file.display(), "Serving asset");
    match ServeFile::new(&file).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(e) => match e {},
    }
}

pub fn middleware(assets: StaticAssets) -> Middleware {
    let assets = Arc::new(assets);
    Middleware::layer(
        NAME,
        axum::middleware::from_fn_with_state(assets, static_assets),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{endpoint, MiddlewareStack};
    use axum::body::Body;
    use std::convert::Infallible;

    fn service(root: &Path) -> crate::middleware::Endpoint {
        let mut stack = MiddlewareStack::new();
        stack.push(middleware(StaticAssets::new(
            root,
            [MountPrefix::new("/assets"), MountPrefix::new("/favicon.ico")],
        )));
        stack.build(endpoint(tower::service_fn(|_: Request| async {
            Ok::<_, Infallible>((StatusCode::IM_A_TEAPOT, "app").into_response())
        })))
    }

    async fn get(root: &Path, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = service(root).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[tokio::test]
    async fn test_serves_existing_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("favicon.ico"), "icon").unwrap();

        assert_eq!(get(dir.path(), "/assets/app.css").await, (StatusCode::OK, "body {}".into()));
        assert_eq!(get(dir.path(), "/favicon.ico").await, (StatusCode::OK, "icon".into()));
    }

    #[tokio::test]
    async fn test_missing_or_unprefixed_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.txt"), "nope").unwrap();

        assert_eq!(get(dir.path(), "/assets/missing.css").await.0, StatusCode::IM_A_TEAPOT);
        assert_eq!(get(dir.path(), "/secret.txt").await.0, StatusCode::IM_A_TEAPOT);
        assert_eq!(get(dir.path(), "/assetsx/a.css").await.0, StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve(root, "/assets/app.css"),
            Some(PathBuf::from("/srv/public/assets/app.css"))
        );
        assert_eq!(resolve(root, "/assets/../../etc/passwd"), None);
    }
}
