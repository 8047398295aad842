// src/middleware/metrics.rs
use axum::{
    body::{Body, Bytes},
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::config::PathLabelMode;
use crate::sink::{MetricsSink, RequestLabels};

/// State for [`metrics_middleware`].
#[derive(Clone)]
pub struct HttpMetrics {
    sink: Arc<dyn MetricsSink>,
    path_label: PathLabelMode,
}

impl HttpMetrics {
    pub fn new(sink: Arc<dyn MetricsSink>, path_label: PathLabelMode) -> Self {
        Self { sink, path_label }
    }

    fn path_of<B>(&self, req: &Request<B>) -> String {
        let matched = match self.path_label {
            PathLabelMode::Raw => None,
            PathLabelMode::Route => req.extensions().get::<MatchedPath>(),
        };
        matched
            .map(|mp| mp.as_str().to_owned())
            .unwrap_or_else(|| req.uri().path().to_owned())
    }
}

/// Metrics middleware to record request count, duration and response size.
///
/// The response body is wrapped so its data frames are counted as they are
/// sent. Measurements are emitted once the body finishes, or when it is dropped
/// unfinished (client went away).
pub async fn metrics_middleware(
    State(metrics): State<HttpMetrics>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = metrics.path_of(&req);

    let response = next.run(req).await;

    let pending = Measurement {
        sink: metrics.sink,
        method,
        path,
        status: response.status(),
        start,
    };
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(ObservedBody::new(body, pending)))
}

struct Measurement {
    sink: Arc<dyn MetricsSink>,
    method: String,
    path: String,
    status: StatusCode,
    start: Instant,
}

impl Measurement {
    fn emit(self, bytes: u64) {
        let labels = RequestLabels {
            method: &self.method,
            path: &self.path,
        };
        self.sink.increment_requests(labels, self.status.as_str());
        self.sink.observe_latency(labels, self.start.elapsed().as_secs_f64());
        self.sink.observe_size(labels, bytes as f64);
    }
}

/// Response body that counts data bytes and reports once it is done.
pub struct ObservedBody {
    inner: Body,
    bytes: u64,
    pending: Option<Measurement>,
}

impl ObservedBody {
    fn new(inner: Body, pending: Measurement) -> Self {
        Self {
            inner,
            bytes: 0,
            pending: Some(pending),
        }
    }

    fn finish(&mut self) {
        if let Some(measurement) = self.pending.take() {
            measurement.emit(self.bytes);
        }
    }
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
            }
            Poll::Ready(None) => this.finish(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ObservedBody {
    fn drop(&mut self) {
        self.finish();
    }
}
