use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeterError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Metrics recorder error: {0}")]
    Recorder(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Invalid buckets for {metric}: {reason}")]
    InvalidBuckets { metric: String, reason: String },

    #[error("Blocking handler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for MeterError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MeterError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("Bad request: {}", msg)),
            MeterError::Config(_)
            | MeterError::Recorder(_)
            | MeterError::InvalidBuckets { .. }
            | MeterError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MeterError>;
