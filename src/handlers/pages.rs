//! Synchronous static pages, served through [`crate::http::Handler`].

use std::collections::HashMap;

use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};

use crate::http::{Handler, Request, ResponseWriter};

/// Mount point of the pages in the demo router.
pub const PREFIX: &str = "/pages/";

pub struct StaticPages {
    pages: HashMap<String, String>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self { pages: HashMap::new() }
    }

    pub fn with_page(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(name.into(), body.into());
        self
    }

    /// The pages shipped with the demo server.
    pub fn demo() -> Self {
        Self::new()
            .with_page("index", "httpmeter demo\n")
            .with_page("about", "Every response here is counted, timed and sized.\n")
    }
}

impl Default for StaticPages {
    fn default() -> Self {
        Self::new()
    }
}

fn send(w: &mut dyn ResponseWriter, body: &[u8]) {
    if let Err(e) = w.write(body) {
        tracing::debug!(error = %e, "page write failed");
    }
}

impl Handler for StaticPages {
    fn serve(&self, req: &Request, w: &mut dyn ResponseWriter) {
        let method = req.method();
        if method != Method::GET && method != Method::HEAD {
            w.headers_mut().insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            w.set_status(StatusCode::METHOD_NOT_ALLOWED);
            send(w, b"method not allowed");
            return;
        }

        let name = req.uri().path().strip_prefix(PREFIX).unwrap_or_default();
        match self.pages.get(name) {
            Some(body) => {
                w.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
                if method == Method::GET {
                    send(w, body.as_bytes());
                }
            }
            None => {
                w.set_status(StatusCode::NOT_FOUND);
                send(w, b"not found");
            }
        }
    }
}
