// src/middleware/logging.rs
use axum::{
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Request logging middleware with correlation ID
pub async fn request_logger(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    info!(%request_id, %method, %path, "➡️ request");

    let start = Instant::now();
    let response = next.run(req).await;

    info!(
        %request_id,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "⬅️ response"
    );
    response
}
