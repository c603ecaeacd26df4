//! HTTP server with graceful shutdown

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{config::Config, cors::cors_layer, error::Result};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wrap `app` in the middleware stack
    ///
    /// Layers listed last run first: panics are caught innermost, CORS is
    /// decided outermost.
    pub fn layered(&self, app: Router) -> Result<Router> {
        let mut app = app
            .layer(CatchPanicLayer::new())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(RequestBodyLimitLayer::new(self.config.service.body_limit_bytes()))
            .layer(TimeoutLayer::with_status_code(
                http::StatusCode::REQUEST_TIMEOUT,
                self.config.service.timeout(),
            ));

        if let Some(cors) = cors_layer(&self.config.web.cors, &self.config.web.response_headers)? {
            app = app.layer(cors);
        }

        Ok(app)
    }

    /// Run the server with the given router
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service_name(), addr);
        self.log_middleware_config();

        let app = self.layered(app)?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        // ConnectInfo feeds the client IP fallback of the header extractor
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    fn log_middleware_config(&self) {
        let web = &self.config.web;
        tracing::info!("Middleware configuration:");
        tracing::info!("  - Panic recovery: enabled");
        tracing::info!(
            "  - Request body limit: {} MB",
            self.config.service.body_limit_mb
        );
        tracing::info!(
            "  - Request timeout: {} seconds",
            self.config.service.timeout_secs
        );
        if web.cors.is_empty() {
            tracing::info!("  - CORS: not configured");
        } else {
            tracing::info!("  - CORS: {} path rules", web.cors.len());
        }
        tracing::info!(
            "  - Error exposure: reason={}, traces={}",
            web.expose_error_reason,
            web.expose_error_traces
        );
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::CorsRule;
    use axum::{body::Body, http::Request, routing::post};
    use tower::ServiceExt;

    #[test]
    fn test_server_creation() {
        let config = Config::default();
        let server = Server::new(config.clone());
        assert_eq!(server.config().service.port, config.service.port);
    }

    #[tokio::test]
    async fn test_layered_router_serves() {
        let mut config = Config::default();
        config.web.cors.insert(
            "/**".to_string(),
            CorsRule {
                allowed_origins: vec!["*".to_string()],
                ..CorsRule::default()
            },
        );
        let app = Server::new(config)
            .layered(Router::new().route("/Test/FindV1", post(|| async { "ok" })))
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/Test/FindV1")
                    .header("origin", "https://app.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let app = Server::new(Config::default())
            .layered(Router::new().route("/Test/PanicV1", post(explode)))
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/Test/PanicV1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
