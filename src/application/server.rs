//! Serving a booted application over TCP.

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::application::Application;

impl Application {
    /// Serve on `listener` until `shutdown` completes, then drain in-flight requests.
    #[allow(deprecated)]
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let timeout = Duration::from_secs(self.config().server.request_timeout_secs);

        tracing::info!(
            address = %addr,
            environment = %self.config().environment,
            routes = self.routes().len(),
            "Hanami server starting"
        );

        let router = Router::new()
            .fallback_service(self.service)
            .layer(TimeoutLayer::new(timeout));

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Hanami server stopped");
        Ok(())
    }
}
