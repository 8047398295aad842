//! Sink backed by the `metrics` facade and the Prometheus exporter.
//!
//! The recorder is process-global: [`PrometheusSink::install`] builds it once,
//! with the bucket layouts from [`MetricsConfig`], and every later call reuses
//! the same handle.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use super::{MetricsSink, RequestLabels};
use crate::config::{BucketConfig, MetricsConfig};
use crate::error::{MeterError, Result};

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Expand an exponential layout into explicit upper bounds.
pub fn exponential_buckets(metric: &str, cfg: &BucketConfig) -> Result<Vec<f64>> {
    let invalid = |reason: &str| MeterError::InvalidBuckets {
        metric: metric.to_string(),
        reason: reason.to_string(),
    };

    if cfg.count == 0 {
        return Err(invalid("count must be at least 1"));
    }
    if !(cfg.start.is_finite() && cfg.start > 0.0) {
        return Err(invalid("start must be a positive number"));
    }
    if !(cfg.factor.is_finite() && cfg.factor > 1.0) {
        return Err(invalid("factor must be greater than 1"));
    }

    let mut bounds = Vec::with_capacity(cfg.count);
    let mut bound = cfg.start;
    for _ in 0..cfg.count {
        bounds.push(bound);
        bound *= cfg.factor;
    }
    Ok(bounds)
}

#[derive(Debug, Clone)]
pub struct PrometheusSink {
    requests_total: String,
    request_duration: String,
    response_size: String,
}

impl PrometheusSink {
    /// Sink emitting under the metric names from `config`. Emission goes to
    /// whichever recorder is active.
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            requests_total: config.requests_total.clone(),
            request_duration: config.request_duration.clone(),
            response_size: config.response_size.clone(),
        }
    }

    /// Exporter builder with the configured histogram layouts applied.
    pub fn builder(config: &MetricsConfig) -> Result<PrometheusBuilder> {
        let latency = exponential_buckets(&config.request_duration, &config.latency_buckets)?;
        let size = exponential_buckets(&config.response_size, &config.size_buckets)?;

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(config.request_duration.clone()), &latency)?
            .set_buckets_for_metric(Matcher::Full(config.response_size.clone()), &size)?;
        Ok(builder)
    }

    /// Install the global recorder (first call only) and return a sink plus the
    /// handle used to render `/metrics`.
    pub fn install(config: &MetricsConfig) -> Result<(Self, PrometheusHandle)> {
        let handle = HANDLE
            .get_or_try_init(|| -> Result<PrometheusHandle> {
                let handle = Self::builder(config)?.install_recorder()?;
                tracing::info!(
                    requests_total = %config.requests_total,
                    request_duration = %config.request_duration,
                    response_size = %config.response_size,
                    "Prometheus recorder installed"
                );
                Ok(handle)
            })?
            .clone();

        let sink = Self::new(config);
        sink.describe();
        Ok((sink, handle))
    }

    /// Register help text and units with the active recorder.
    pub fn describe(&self) {
        describe_counter!(
            self.requests_total.clone(),
            "How many HTTP requests have been processed"
        );
        describe_histogram!(
            self.request_duration.clone(),
            Unit::Seconds,
            "The latency of the HTTP requests."
        );
        describe_histogram!(
            self.response_size.clone(),
            Unit::Bytes,
            "The size of the HTTP responses."
        );
    }
}

impl MetricsSink for PrometheusSink {
    fn increment_requests(&self, labels: RequestLabels<'_>, status: &str) {
        counter!(
            self.requests_total.clone(),
            "method" => labels.method.to_owned(),
            "path" => labels.path.to_owned(),
            "status" => status.to_owned()
        )
        .increment(1);
    }

    fn observe_latency(&self, labels: RequestLabels<'_>, seconds: f64) {
        histogram!(
            self.request_duration.clone(),
            "path" => labels.path.to_owned(),
            "method" => labels.method.to_owned()
        )
        .record(seconds);
    }

    fn observe_size(&self, labels: RequestLabels<'_>, bytes: f64) {
        histogram!(
            self.response_size.clone(),
            "path" => labels.path.to_owned(),
            "method" => labels.method.to_owned()
        )
        .record(bytes);
    }
}
