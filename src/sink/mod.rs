//! Metrics sink seam.
//!
//! The wrapper only ever talks to a [`MetricsSink`]. Production code installs a
//! [`PrometheusSink`]; tests substitute [`MemorySink`].

pub mod memory;
pub mod prometheus;

use std::sync::Arc;

pub use memory::MemorySink;
pub use prometheus::PrometheusSink;

/// The `{method, path}` dimensions shared by all three measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLabels<'a> {
    pub method: &'a str,
    pub path: &'a str,
}

/// Write-only aggregate registry. Implementations must accept concurrent calls.
pub trait MetricsSink: Send + Sync {
    /// Count one finished request under `{method, path, status}`.
    fn increment_requests(&self, labels: RequestLabels<'_>, status: &str);

    /// Observe request latency in seconds under `{path, method}`.
    fn observe_latency(&self, labels: RequestLabels<'_>, seconds: f64);

    /// Observe response body size in bytes under `{path, method}`.
    fn observe_size(&self, labels: RequestLabels<'_>, bytes: f64);
}

impl<S: MetricsSink + ?Sized> MetricsSink for Arc<S> {
    fn increment_requests(&self, labels: RequestLabels<'_>, status: &str) {
        (**self).increment_requests(labels, status)
    }

    fn observe_latency(&self, labels: RequestLabels<'_>, seconds: f64) {
        (**self).observe_latency(labels, seconds)
    }

    fn observe_size(&self, labels: RequestLabels<'_>, bytes: f64) {
        (**self).observe_size(labels, bytes)
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &S {
    fn increment_requests(&self, labels: RequestLabels<'_>, status: &str) {
        (**self).increment_requests(labels, status)
    }

    fn observe_latency(&self, labels: RequestLabels<'_>, seconds: f64) {
        (**self).observe_latency(labels, seconds)
    }

    fn observe_size(&self, labels: RequestLabels<'_>, bytes: f64) {
        (**self).observe_size(labels, bytes)
    }
}
