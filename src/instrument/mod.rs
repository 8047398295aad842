//! Handler decorator that records request count, latency and response size.
//!
//! ```
//! use std::sync::Arc;
//! use httpmeter::http::{handler_fn, Handler, Request, ResponseWriter, BufferedResponse};
//! use httpmeter::instrument::instrument;
//! use httpmeter::sink::MemorySink;
//!
//! let sink = Arc::new(MemorySink::new());
//! let app = instrument(
//!     handler_fn(|_: &Request, w: &mut dyn ResponseWriter| {
//!         let _ = w.write(b"hello");
//!     }),
//!     sink.clone(),
//! );
//!
//! let req = axum::http::Request::builder().uri("/hello").body(Default::default()).unwrap();
//! app.serve(&req, &mut BufferedResponse::new());
//!
//! assert_eq!(sink.requests("GET", "/hello", "200"), 1);
//! assert_eq!(sink.sizes("GET", "/hello"), vec![5.0]);
//! ```
//!
//! The `path` label is the raw request path. Paths with embedded ids create
//! one series per id; use [`Instrumented::with_route_template`] to collapse them.

pub mod observer;

use std::sync::Arc;
use std::time::Instant;

use crate::http::{Handler, Request, ResponseWriter};
use crate::sink::{MetricsSink, RequestLabels};

pub use observer::ResponseObserver;

type RouteTemplate = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

/// A [`Handler`] that measures every call to `inner` and reports to `sink`.
pub struct Instrumented<H, S> {
    inner: H,
    sink: S,
    route_template: Option<RouteTemplate>,
}

/// Wrap `inner` so each request is reported to `sink`.
pub fn instrument<H, S>(inner: H, sink: S) -> Instrumented<H, S>
where
    H: Handler,
    S: MetricsSink,
{
    Instrumented {
        inner,
        sink,
        route_template: None,
    }
}

impl<H, S> Instrumented<H, S> {
    /// Label requests with the template returned by `resolve` instead of the raw
    /// path. Returning `None` keeps the raw path for that request.
    pub fn with_route_template<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.route_template = Some(Arc::new(resolve));
        self
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<H: Handler, S: MetricsSink> Handler for Instrumented<H, S> {
    fn serve(&self, req: &Request, w: &mut dyn ResponseWriter) {
        let mut observer = ResponseObserver::new(w);
        let start = Instant::now();

        self.inner.serve(req, &mut observer);

        let elapsed = start.elapsed();
        let template = self.route_template.as_ref().and_then(|resolve| resolve(req));
        let labels = RequestLabels {
            method: req.method().as_str(),
            path: template.as_deref().unwrap_or_else(|| req.uri().path()),
        };
        let status = observer.status().as_u16().to_string();

        self.sink.increment_requests(labels, &status);
        self.sink.observe_latency(labels, elapsed.as_secs_f64());
        self.sink.observe_size(labels, observer.bytes_written() as f64);

        tracing::trace!(
            method = labels.method,
            path = labels.path,
            status = %status,
            bytes = observer.bytes_written(),
            elapsed_ms = elapsed.as_millis() as u64,
            "request measured"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{handler_fn, BufferedResponse};
    use crate::sink::MemorySink;
    use axum::body::Bytes;
    use axum::http::StatusCode;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::time::Duration;

    fn request(method: &str, uri: &str) -> Request {
        axum::http::Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn not_found_scenario() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(
            handler_fn(|_: &Request, w: &mut dyn ResponseWriter| {
                w.set_status(StatusCode::NOT_FOUND);
                std::thread::sleep(Duration::from_millis(10));
                let _ = w.write(b"not found");
            }),
            sink.clone(),
        );

        let mut out = BufferedResponse::new();
        app.serve(&request("GET", "/x"), &mut out);

        assert_eq!(sink.requests("GET", "/x", "404"), 1);
        assert_eq!(sink.total_requests(), 1);
        let latencies = sink.latencies("GET", "/x");
        assert_eq!(latencies.len(), 1);
        assert!(latencies[0] >= 0.010);
        assert_eq!(sink.sizes("GET", "/x"), vec![9.0]);

        assert_eq!(out.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(out.body(), b"not found");
    }

    #[test]
    fn silent_handler_defaults_to_200_and_zero_bytes() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(handler_fn(|_: &Request, _: &mut dyn ResponseWriter| {}), sink.clone());

        let mut out = BufferedResponse::new();
        app.serve(&request("GET", "/quiet"), &mut out);

        assert_eq!(sink.requests("GET", "/quiet", "200"), 1);
        assert_eq!(sink.sizes("GET", "/quiet"), vec![0.0]);
        assert_eq!(out.status(), None);
    }

    #[test]
    fn size_is_sum_of_chunk_lengths() {
        let chunks: Vec<Vec<u8>> = vec![vec![1; 3], vec![], vec![2; 1024], vec![3; 7]];
        let expected: usize = chunks.iter().map(Vec::len).sum();

        let sink = Arc::new(MemorySink::new());
        let body = chunks.clone();
        let app = instrument(
            handler_fn(move |_: &Request, w: &mut dyn ResponseWriter| {
                for chunk in &body {
                    let _ = w.write(chunk);
                }
            }),
            sink.clone(),
        );

        let mut out = BufferedResponse::new();
        app.serve(&request("GET", "/blob"), &mut out);

        assert_eq!(sink.sizes("GET", "/blob"), vec![expected as f64]);
        assert_eq!(out.body(), chunks.concat().as_slice());
    }

    #[test]
    fn last_status_before_write_is_recorded() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(
            handler_fn(|_: &Request, w: &mut dyn ResponseWriter| {
                w.set_status(StatusCode::CREATED);
                w.set_status(StatusCode::SERVICE_UNAVAILABLE);
                let _ = w.write(b"busy");
            }),
            sink.clone(),
        );

        app.serve(&request("PUT", "/jobs"), &mut BufferedResponse::new());

        assert_eq!(sink.requests("PUT", "/jobs", "503"), 1);
        assert_eq!(sink.requests("PUT", "/jobs", "201"), 0);
    }

    #[test]
    fn status_set_after_first_write_is_recorded() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(
            handler_fn(|_: &Request, w: &mut dyn ResponseWriter| {
                let _ = w.write(b"half a page");
                w.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }),
            sink.clone(),
        );

        let mut out = BufferedResponse::new();
        app.serve(&request("GET", "/late"), &mut out);

        assert_eq!(out.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(sink.requests("GET", "/late", "500"), 1);
        assert_eq!(sink.requests("GET", "/late", "200"), 0);
        assert_eq!(sink.sizes("GET", "/late"), vec![11.0]);
    }

    #[test]
    fn labels_are_raw_method_and_path() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(handler_fn(|_: &Request, _: &mut dyn ResponseWriter| {}), sink.clone());

        app.serve(&request("POST", "/items/42?expand=true"), &mut BufferedResponse::new());

        assert_eq!(sink.requests("POST", "/items/42", "200"), 1);
        assert_eq!(sink.latencies("POST", "/items/42").len(), 1);
        assert_eq!(sink.sizes("POST", "/items/42").len(), 1);
    }

    #[test]
    fn latency_grows_with_handler_delay() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(
            handler_fn(|req: &Request, _: &mut dyn ResponseWriter| {
                let ms: u64 = req.uri().path().trim_start_matches('/').parse().unwrap();
                std::thread::sleep(Duration::from_millis(ms));
            }),
            sink.clone(),
        );

        app.serve(&request("GET", "/0"), &mut BufferedResponse::new());
        app.serve(&request("GET", "/30"), &mut BufferedResponse::new());

        let fast = sink.latencies("GET", "/0")[0];
        let slow = sink.latencies("GET", "/30")[0];
        assert!(fast >= 0.0);
        assert!(slow >= 0.030);
        assert!(slow > fast);
    }

    #[test]
    fn route_template_collapses_ids() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(handler_fn(|_: &Request, _: &mut dyn ResponseWriter| {}), sink.clone())
            .with_route_template(|req| {
                req.uri()
                    .path()
                    .strip_prefix("/items/")
                    .map(|_| "/items/{id}".to_string())
            });

        for uri in ["/items/1", "/items/2", "/other"] {
            app.serve(&request("GET", uri), &mut BufferedResponse::new());
        }

        assert_eq!(sink.requests("GET", "/items/{id}", "200"), 2);
        assert_eq!(sink.requests("GET", "/other", "200"), 1);
        assert_eq!(sink.requests("GET", "/items/1", "200"), 0);
    }

    #[test]
    fn panicking_handler_records_nothing() {
        let sink = Arc::new(MemorySink::new());
        let app = instrument(
            handler_fn(|_: &Request, w: &mut dyn ResponseWriter| {
                let _ = w.write(b"partial");
                panic!("handler failed");
            }),
            sink.clone(),
        );

        let mut out = BufferedResponse::new();
        let result = catch_unwind(AssertUnwindSafe(|| app.serve(&request("GET", "/boom"), &mut out)));

        assert!(result.is_err());
        assert!(sink.is_empty());
        assert_eq!(out.body(), b"partial");
    }

    #[test]
    fn concurrent_requests_are_each_counted_once() {
        let sink = Arc::new(MemorySink::new());
        let app = Arc::new(instrument(
            handler_fn(|req: &Request, w: &mut dyn ResponseWriter| {
                let _ = w.write(req.uri().path().as_bytes());
            }),
            sink.clone(),
        ));

        std::thread::scope(|s| {
            for t in 0..8 {
                let app = Arc::clone(&app);
                s.spawn(move || {
                    for _ in 0..100 {
                        let path = format!("/t/{}", t);
                        app.serve(&request("GET", &path), &mut BufferedResponse::new());
                    }
                });
            }
        });

        assert_eq!(sink.total_requests(), 800);
        for t in 0..8 {
            let path = format!("/t/{}", t);
            assert_eq!(sink.requests("GET", &path, "200"), 100);
            let sizes = sink.sizes("GET", &path);
            assert_eq!(sizes.len(), 100);
            assert!(sizes.iter().all(|&s| s == path.len() as f64));
        }
    }

    #[test]
    fn nested_wrappers_see_the_same_outcome() {
        let outer_sink = Arc::new(MemorySink::new());
        let inner_sink = Arc::new(MemorySink::new());
        let app = instrument(
            instrument(
                handler_fn(|_: &Request, w: &mut dyn ResponseWriter| {
                    w.set_status(StatusCode::IM_A_TEAPOT);
                    let _ = w.write(b"tea");
                }),
                inner_sink.clone(),
            ),
            outer_sink.clone(),
        );

        app.serve(&request("GET", "/pot"), &mut BufferedResponse::new());

        for sink in [&outer_sink, &inner_sink] {
            assert_eq!(sink.requests("GET", "/pot", "418"), 1);
            assert_eq!(sink.sizes("GET", "/pot"), vec![3.0]);
        }
    }
}
