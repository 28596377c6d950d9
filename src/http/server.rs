//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Build the shared request state from configuration
//! - Create the Axum router with the pipeline handler
//! - Serve each accepted connection on its own task
//! - Graceful shutdown with a bounded grace period

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::task::JoinSet;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::handler::handle_request;
use crate::lifecycle::ShutdownSignal;
use crate::http::response::ResponseEncoder;
use crate::net::connection::OpenConnections;
use crate::net::listener::Listener;
use crate::processing::Collaborators;
use crate::resilience::AdmissionController;
use crate::security::{Cors, SecretGate};

/// How long in-flight requests may run after shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Largest request head accepted.
const MAX_HEADER_BYTES: usize = 1 << 20;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub admission: AdmissionController,
    pub auth: Arc<SecretGate>,
    pub cors: Cors,
    pub encoder: ResponseEncoder,
    pub collaborators: Collaborators,
    pub write_timeout: Duration,
    pub etag_enabled: bool,
}

impl AppState {
    pub fn new(config: &GatewayConfig, collaborators: Collaborators) -> Self {
        Self {
            admission: AdmissionController::new(config.processing.concurrency),
            auth: Arc::new(SecretGate::new(config.security.secret.as_deref())),
            cors: Cors::new(config.security.allow_origin.as_deref()),
            encoder: ResponseEncoder::new(&config.response),
            collaborators,
            write_timeout: Duration::from_secs(config.timeouts.write_secs),
            etag_enabled: config.response.etag_enabled,
        }
    }
}

/// HTTP server for the image gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    read_timeout: Duration,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &GatewayConfig, collaborators: Collaborators) -> Self {
        let state = AppState::new(config, collaborators);
        let router = Self::build_router(state.clone());

        Self {
            router,
            state,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
        }
    }

    /// Every path goes through the same pipeline.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(handle_request)
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = listener.max_connections(),
            concurrency = self.state.admission.capacity(),
            secret = self.state.auth.is_enabled(),
            cors = self.state.cors.is_enabled(),
            "HTTP server starting"
        );

        let graceful = GracefulShutdown::new();
        let open = OpenConnections::new();
        let mut connections = JoinSet::new();

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.read_timeout)
            .max_buf_size(MAX_HEADER_BYTES);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };

                    let slot = open.open(peer_addr);
                    let service = TowerToHyperService::new(self.router.clone());
                    let conn = graceful.watch(builder.serve_connection(TokioIo::new(stream), service));

                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(conn = slot.seq(), peer_addr = %slot.peer(), error = %e, "Connection error");
                        }
                        drop(slot);
                        drop(permit);
                    });
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = shutdown.triggered() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        // Stop accepting before draining.
        drop(listener);

        tracing::info!(
            open_connections = open.count(),
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Draining connections"
        );
        match tokio::time::timeout(SHUTDOWN_GRACE, graceful.shutdown()).await {
            Ok(()) => tracing::info!("All connections closed"),
            Err(_) => tracing::warn!(
                open_connections = open.count(),
                "Grace period elapsed, closing remaining connections"
            ),
        }
        connections.shutdown().await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
