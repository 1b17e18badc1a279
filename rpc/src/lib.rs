//! HTTP/JSON server for the clinical intake backend.
//!
//! Provides endpoints for:
//! - The three doctor verification steps
//! - Drafting, reading back and committing forms
//! - Liveness
//! - Prometheus metrics
//!
//! Every response body is an [`Envelope`]. Business failures are `200`
//! with `success: false`; only request-shape problems and infrastructure
//! outages use other status codes. `/metrics` is the exception: it serves
//! the Prometheus text format.

pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod spans;

pub use envelope::Envelope;
pub use error::RpcError;
pub use metrics::RpcMetrics;
pub use server::{RpcServer, RpcState};
