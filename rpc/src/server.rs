//! Axum-based RPC server.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use intake_forms::FormWorkflow;
use intake_verification::VerificationMachine;
use tokio::net::TcpListener;

use crate::error::RpcError;
use crate::handlers;
use crate::metrics::{self, RpcMetrics};
use crate::middleware::request_id;

/// Upper bound on a request body, attachments included.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Shared state handed to every handler.
pub struct RpcState {
    pub started_at: Instant,
    pub verification: Arc<VerificationMachine>,
    pub forms: Arc<FormWorkflow>,
    pub metrics: Arc<RpcMetrics>,
}

impl RpcState {
    pub fn new(
        verification: Arc<VerificationMachine>,
        forms: Arc<FormWorkflow>,
        metrics: Arc<RpcMetrics>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            verification,
            forms,
            metrics,
        }
    }
}

pub struct RpcServer {
    pub bind: String,
    pub port: u16,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn with_state(bind: impl Into<String>, port: u16, state: Arc<RpcState>) -> Self {
        Self {
            bind: bind.into(),
            port,
            state,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, RpcError> {
        let addr = format!("{}:{}", self.bind, self.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))
    }

    /// Serve on `listener` until `shutdown` resolves, then wait for
    /// in-flight requests to finish.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("RPC server listening on {addr}");
        }
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

pub fn router(state: Arc<RpcState>) -> Router {
    Router::new()
        .route("/verification/identity", post(handlers::verify_identity))
        .route("/verification/username", post(handlers::verify_username))
        .route("/verification/dob", post(handlers::verify_dob))
        .route("/forms", post(handlers::draft_form))
        .route(
            "/forms/:id",
            get(handlers::read_draft).post(handlers::commit_form),
        )
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics::track,
        ))
        .layer(axum::middleware::from_fn(request_id))
        .with_state(state)
}
