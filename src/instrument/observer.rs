// src/instrument/observer.rs
use std::io;

use axum::http::{Extensions, HeaderMap, StatusCode};

use crate::http::ResponseWriter;

/// Writer proxy that remembers the last status and counts body bytes.
///
/// Everything is forwarded to the wrapped writer unchanged, including write
/// errors. Bytes are counted when offered, so a failed write still adds to
/// [`bytes_written`](Self::bytes_written).
pub struct ResponseObserver<W> {
    inner: W,
    status: StatusCode,
    bytes_written: u64,
}

impl<W: ResponseWriter> ResponseObserver<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            status: StatusCode::OK,
            bytes_written: 0,
        }
    }

    /// Last status set through the proxy, or 200.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for ResponseObserver<W> {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.inner.set_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes_written += buf.len() as u64;
        self.inner.write(buf)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        self.inner.extensions_mut()
    }
}

impl<W: ResponseWriter> io::Write for ResponseObserver<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ResponseWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        ResponseWriter::flush(self)
    }
}
