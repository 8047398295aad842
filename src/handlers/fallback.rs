use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Any path no route matched.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
