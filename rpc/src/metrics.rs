//! Prometheus metrics for the HTTP surface.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] holding a request counter
//! (method, route, status) and a latency histogram (method, route). The
//! `/metrics` route encodes it in the Prometheus text exposition format.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::RpcState;

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

pub struct RpcMetrics {
    pub registry: Registry,
    /// Total HTTP requests by method, route and status code.
    pub requests_total: IntCounterVec,
    /// HTTP request latency in seconds by method and route.
    pub request_duration_seconds: HistogramVec,
}

impl RpcMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = register_int_counter_vec_with_registry!(
            Opts::new("http_requests_total", "Total HTTP Requests"),
            &["method", "endpoint", "http_status"],
            registry
        )?;

        let request_duration_seconds = register_histogram_vec_with_registry!(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency"),
            &["method", "endpoint"],
            registry
        )?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
        })
    }

    pub fn observe(&self, method: &str, endpoint: &str, status: u16, seconds: f64) {
        self.request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(seconds);
        self.requests_total
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
    }

    /// Encode every registered metric. Returns the body and its content type.
    pub fn encode(&self) -> Result<(Vec<u8>, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((buffer, encoder.format_type().to_string()))
    }
}

/// Count and time every request against the route it matched.
pub async fn track(State(state): State<Arc<RpcState>>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let started = Instant::now();
    let response = next.run(req).await;
    state.metrics.observe(
        &method,
        &endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
