use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use httpmeter::config::Config;
use httpmeter::server::{router, AppState};
use httpmeter::sink::{MetricsSink, PrometheusSink, RequestLabels};

fn app() -> Router {
    let config = Config::default();
    let (sink, handle) = PrometheusSink::install(&config.metrics).unwrap();
    router(AppState {
        config,
        sink: Arc::new(sink),
        handle,
    })
}

async fn get_text(app: Router, method: &str, uri: &str, body: &'static str) -> (StatusCode, String) {
    let req = Request::builder().method(method).uri(uri).body(Body::from(body)).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn install_is_idempotent() {
    let config = Config::default();
    let (first_sink, _) = PrometheusSink::install(&config.metrics).unwrap();
    let (_, second) = PrometheusSink::install(&config.metrics).unwrap();

    let labels = RequestLabels {
        method: "PATCH",
        path: "/installed-once",
    };
    first_sink.increment_requests(labels, "204");
    first_sink.observe_size(labels, 12.0);

    let text = second.render();
    let counter = text
        .lines()
        .find(|l| l.starts_with("http_requests_total{") && l.contains(r#"path="/installed-once""#))
        .expect("counter emitted through the first sink");
    assert!(counter.contains(r#"method="PATCH""#));
    assert!(counter.contains(r#"status="204""#));
    assert!(counter.ends_with(" 1"));
    assert!(text
        .lines()
        .any(|l| l.starts_with("http_request_size_bytes_count{") && l.contains(r#"path="/installed-once""#)));
}

#[tokio::test]
async fn scrape_exposes_request_families() {
    get_text(app(), "GET", "/pages/index", "").await;
    get_text(app(), "POST", "/echo", "ping").await;

    let (status, text) = get_text(app(), "GET", "/metrics", "").await;
    assert_eq!(status, StatusCode::OK);

    let counter_line = |path: &str| {
        text.lines()
            .find(|l| l.starts_with("http_requests_total{") && l.contains(&format!("path=\"{}\"", path)))
            .map(str::to_owned)
    };

    let page = counter_line("/pages/index").expect("page counter");
    assert!(page.contains(r#"method="GET""#));
    assert!(page.contains(r#"status="200""#));

    let echo = counter_line("/echo").expect("echo counter");
    assert!(echo.contains(r#"method="POST""#));

    assert!(text.contains("# HELP http_request_duration_seconds"));
    assert!(text.contains("http_request_size_bytes_bucket{"));
}
