// src/server.rs
use std::sync::Arc;

use axum::{
    handler::Handler as _,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{Config, PathLabelMode};
use crate::handlers::{echo::echo, fallback::not_found, health, pages::StaticPages};
use crate::http::{bridge, Handler};
use crate::instrument::instrument;
use crate::middleware::{metrics_middleware, request_logger, HttpMetrics};
use crate::sink::MetricsSink;

const PAGES_ROUTE: &str = "/pages/{*name}";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sink: Arc<dyn MetricsSink>,
    pub handle: PrometheusHandle,
}

/// Build the application router.
///
/// Async routes and the 404 fallback are measured by [`metrics_middleware`];
/// `/pages` is served by a synchronous handler measured by [`instrument`].
/// Each request is measured once.
pub fn router(state: AppState) -> Router {
    let metrics = HttpMetrics::new(state.sink.clone(), state.config.metrics.path_label);

    let mut pages = instrument(StaticPages::demo(), state.sink.clone());
    if state.config.metrics.path_label == PathLabelMode::Route {
        pages = pages.with_route_template(|_| Some(PAGES_ROUTE.to_string()));
    }
    let pages: Arc<dyn Handler> = Arc::new(pages);

    let measured = Router::<AppState>::new()
        .route("/healthz", get(health::health_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route("/echo", post(echo))
        .route_layer(from_fn_with_state(metrics.clone(), metrics_middleware))
        // route_layer skips the fallback, so it carries its own copy.
        .fallback(not_found.layer(from_fn_with_state(metrics, metrics_middleware)));

    let synchronous = Router::<AppState>::new().route(PAGES_ROUTE, bridge::route(pages));

    measured
        .merge(synchronous)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn(request_logger)),
        )
}
