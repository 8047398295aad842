//! Serve a synchronous [`Handler`] from an axum router.
//!
//! The route buffers the body with axum's `Bytes` extractor, so an oversized
//! body is rejected with `413 Payload Too Large` before the handler runs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};

use super::{BufferedResponse, Handler, Request};
use crate::error::Result;

/// Upper bound on buffered request bodies.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Route every method to `handler` through [`dispatch`].
pub fn route<S>(handler: Arc<dyn Handler>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    any(move |parts: Parts, body: Bytes| {
        let handler = Arc::clone(&handler);
        async move { dispatch(handler, Request::from_parts(parts, body)).await }
    })
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// Run `handler` on the blocking pool and send what it wrote.
///
/// A panic inside the handler is resumed on the calling task rather than turned
/// into a response.
pub async fn dispatch(handler: Arc<dyn Handler>, req: Request) -> Result<Response> {
    let joined = tokio::task::spawn_blocking(move || {
        let mut out = BufferedResponse::new();
        handler.serve(&req, &mut out);
        out
    })
    .await;

    match joined {
        Ok(out) => Ok(out.into_response()),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(e.into()),
    }
}
