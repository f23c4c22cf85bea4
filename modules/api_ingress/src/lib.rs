//! HTTP host: assembles the router (health, docs, module routes), installs the
//! middleware stack and serves it until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, Method};
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Request bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct ApiIngress {
    config: ApiIngressConfig,
    request_timeout: Option<Duration>,
}

impl ApiIngress {
    /// `request_timeout` of `None` leaves requests without a deadline.
    pub fn new(config: ApiIngressConfig, request_timeout: Option<Duration>) -> Self {
        Self {
            config,
            request_timeout,
        }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Base router with the liveness endpoint; modules add their routes on top.
    pub fn rest_prepare(&self) -> Router {
        tracing::debug!("REST host prepared base router with health check");
        Router::new().route("/health", get(web::health_check))
    }

    /// Attach the docs endpoints (when enabled) and the middleware stack.
    pub fn rest_finalize(
        &self,
        mut router: Router,
        openapi: &utoipa::openapi::OpenApi,
    ) -> Result<Router> {
        if self.config.enable_docs {
            // Build once, serve as static JSON (no per-request serialization)
            let doc = Arc::new(openapi.to_json().context("failed to render OpenAPI document")?);
            tracing::info!(
                paths = openapi.paths.paths.len(),
                "serving OpenAPI document at {}",
                web::DOC_JSON_PATH
            );

            router = router
                .route(
                    web::DOC_JSON_PATH,
                    get(move || {
                        let doc = doc.clone();
                        async move {
                            (
                                [
                                    (header::CONTENT_TYPE, "application/json"),
                                    (header::CACHE_CONTROL, "no-store"),
                                ],
                                (*doc).clone(),
                            )
                                .into_response()
                        }
                    }),
                )
                .route("/swagger/{*any}", get(web::serve_docs));
        }

        let router = self.apply_middleware(router);
        tracing::debug!("REST host finalized router");
        Ok(router)
    }

    /// Layers are added innermost first. `SetRequestIdLayer` is outermost so the id
    /// exists before the trace span opens and before it is echoed on the response.
    fn apply_middleware(&self, mut router: Router) -> Router {
        router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));

        if self.config.cors_enabled {
            router = router.layer(cors_layer());
        }

        if let Some(timeout) = self.request_timeout {
            router = router.layer(TimeoutLayer::new(timeout));
        }

        router
            .layer(request_id::trace_layer())
            .layer(PropagateRequestIdLayer::new(request_id::header()))
            .layer(SetRequestIdLayer::new(
                request_id::header(),
                request_id::NanoRequestId,
            ))
    }

    /// Bind `bind_addr` and serve until `shutdown` resolves.
    pub async fn serve<F>(&self, bind_addr: &str, router: Router, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            HeaderName::from_static("platform-id"),
            header::CONTENT_TYPE,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            header::CACHE_CONTROL,
        ])
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("HTTP server shutting down gracefully");
}
