use axum::body::Bytes;

use crate::error::{MeterError, Result};

/// POST /echo
pub async fn echo(body: Bytes) -> Result<Bytes> {
    if body.is_empty() {
        return Err(MeterError::BadRequest("empty body".to_string()));
    }
    Ok(body)
}
