//! Synchronous handler contract.
//!
//! A [`Handler`] receives the request and a [`ResponseWriter`] and produces the
//! response by side effect: it may set a status, touch headers, and write any
//! number of body chunks. Decorators (see [`crate::instrument`]) wrap both sides
//! of that contract without changing it.

pub mod bridge;
pub mod buffered;

use std::io;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Extensions, HeaderMap, StatusCode};

pub use buffered::BufferedResponse;

/// Request as seen by synchronous handlers. The body is fully buffered.
pub type Request = axum::http::Request<Bytes>;

/// Capability set of a response sink.
///
/// `set_status` and `write` are the operations decorators care about; the rest
/// exist so a wrapping writer can hand them through untouched.
pub trait ResponseWriter {
    /// Set the response status. Callers may call this more than once; sinks
    /// decide what a late call means.
    fn set_status(&mut self, status: StatusCode);

    /// Write a body chunk, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Per-response typed storage for capabilities beyond the ones above.
    fn extensions_mut(&mut self) -> &mut Extensions;
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        (**self).extensions_mut()
    }
}

/// Processes one request by writing into `w`.
pub trait Handler: Send + Sync {
    fn serve(&self, req: &Request, w: &mut dyn ResponseWriter);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, req: &Request, w: &mut dyn ResponseWriter) {
        (**self).serve(req, w)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, req: &Request, w: &mut dyn ResponseWriter) {
        (**self).serve(req, w)
    }
}

/// Handler built from a closure, see [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Turn a closure into a [`Handler`].
///
/// ```
/// use httpmeter::http::{handler_fn, Request, ResponseWriter};
///
/// let hello = handler_fn(|_req: &Request, w: &mut dyn ResponseWriter| {
///     let _ = w.write(b"hello");
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request, &mut dyn ResponseWriter) + Send + Sync,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request, &mut dyn ResponseWriter) + Send + Sync,
{
    fn serve(&self, req: &Request, w: &mut dyn ResponseWriter) {
        (self.f)(req, w)
    }
}
