//! In-process sink that keeps every observation. Meant for tests and debugging.

use dashmap::DashMap;

use super::{MetricsSink, RequestLabels};

type SeriesKey = (String, String);

#[derive(Debug, Default)]
pub struct MemorySink {
    requests: DashMap<(String, String, String), u64>,
    latencies: DashMap<SeriesKey, Vec<f64>>,
    sizes: DashMap<SeriesKey, Vec<f64>>,
}

fn series(labels: RequestLabels<'_>) -> SeriesKey {
    (labels.method.to_string(), labels.path.to_string())
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter value for `{method, path, status}`.
    pub fn requests(&self, method: &str, path: &str, status: &str) -> u64 {
        let key = (method.to_string(), path.to_string(), status.to_string());
        self.requests.get(&key).map(|v| *v.value()).unwrap_or(0)
    }

    /// Sum over every counter series.
    pub fn total_requests(&self) -> u64 {
        self.requests.iter().map(|r| *r.value()).sum()
    }

    /// Number of distinct `{method, path, status}` series seen.
    pub fn request_series(&self) -> usize {
        self.requests.len()
    }

    /// Latency observations for `{path, method}`, in emission order.
    pub fn latencies(&self, method: &str, path: &str) -> Vec<f64> {
        self.latencies
            .get(&(method.to_string(), path.to_string()))
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    /// Size observations for `{path, method}`, in emission order.
    pub fn sizes(&self, method: &str, path: &str) -> Vec<f64> {
        self.sizes
            .get(&(method.to_string(), path.to_string()))
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.latencies.is_empty() && self.sizes.is_empty()
    }
}

impl MetricsSink for MemorySink {
    fn increment_requests(&self, labels: RequestLabels<'_>, status: &str) {
        let key = (labels.method.to_string(), labels.path.to_string(), status.to_string());
        *self.requests.entry(key).or_insert(0) += 1;
    }

    fn observe_latency(&self, labels: RequestLabels<'_>, seconds: f64) {
        self.latencies.entry(series(labels)).or_insert_with(Vec::new).push(seconds);
    }

    fn observe_size(&self, labels: RequestLabels<'_>, bytes: f64) {
        self.sizes.entry(series(labels)).or_insert_with(Vec::new).push(bytes);
    }
}
