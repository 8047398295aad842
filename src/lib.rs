//! Request metrics for HTTP handlers.
//!
//! [`instrument::instrument`] wraps a synchronous [`http::Handler`] and reports
//! every request's status, latency and response size to a [`sink::MetricsSink`].
//! [`middleware::metrics_middleware`] does the same for axum routers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod instrument;
pub mod middleware;
pub mod server;
pub mod sink;
