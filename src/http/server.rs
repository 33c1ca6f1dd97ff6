//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, timeout, CORS)
//! - Bind server to listener
//! - Share the worker bridge and storage layout with handlers
//! - Shut down gracefully on signal or `Shutdown::trigger`

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers::{get_photo, health, send_photo};
use crate::http::request::RequestIdExt;
use crate::job::StorageLayout;
use crate::lifecycle::{shutdown, signals};
use crate::security::headers::with_cors;
use crate::worker::WorkerBridge;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<WorkerBridge>,
    pub layout: Arc<StorageLayout>,
}

/// HTTP server for the photo gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Creates the storage directories; fails if they cannot be prepared.
    pub fn new(config: GatewayConfig) -> Result<Self, std::io::Error> {
        let layout = Arc::new(StorageLayout::prepare(&config.storage)?);
        let bridge = Arc::new(WorkerBridge::new(config.worker.clone()));

        tracing::info!(
            worker = %bridge.address(),
            connect_timeout = ?bridge.connect_timeout(),
            read_timeout = ?bridge.read_timeout(),
            "Worker bridge configured"
        );

        let state = AppState { bridge, layout };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/send_photo", post(send_photo))
            .route("/photo/{name}", get(get_photo))
            .route("/health", get(health))
            .layer(DefaultBodyLimit::max(config.limits.max_upload_bytes))
            .with_state(state);

        if let Some(public_dir) = &config.storage.public_dir {
            tracing::info!(public_dir = %public_dir.display(), "Serving static files");
            router = router.fallback_service(ServeDir::new(public_dir));
        }

        let router = router
            .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request.request_id(),
                    )
                }),
            )
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        with_cors(router)
    }

    /// Run the server until a signal arrives or `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signals::shutdown_signal() => {},
                    _ = shutdown::triggered(shutdown_rx) => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
