//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path
//! - Wire up middleware (request ID, tracing, CORS headers)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use axum::{routing::any, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::cors::cors_headers;
use crate::http::relay::relay_handler;
use crate::http::request::MakeRequestUuidV4;
use crate::peer::{ResolvePeer, StaticPeer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub peer: Arc<dyn ResolvePeer>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server relaying to the configured peer.
    pub fn new(config: RelayConfig) -> Self {
        let peer = Arc::new(StaticPeer::from_config(&config.peer, &config.timeouts));
        Self::with_resolver(config, peer)
    }

    /// Create a server that asks `peer` for the endpoint on every request.
    pub fn with_resolver(config: RelayConfig, peer: Arc<dyn ResolvePeer>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            peer,
        };

        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            );

        for (name, value) in cors_headers() {
            router = router.layer(SetResponseHeaderLayer::overriding(name, value));
        }
        router
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            peer = %self.config.peer.address,
            mock_mode = self.config.peer.mock_mode,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
