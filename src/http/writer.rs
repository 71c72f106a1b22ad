//! Response writer decorator.
//!
//! # Responsibilities
//! - Track whether a status was written, which one, and the body size
//! - Default the status to 200 on the first body write or flush
//!
//! # Design Decisions
//! - The decorator owns its sink; engines hand in a [`BufferedSink`]
//! - Status may be overwritten after a body write; the last status wins

use std::io;

use bytes::{Bytes, BytesMut};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};

/// Sink that can push buffered output to the peer.
pub trait Flush {
    fn flush(&mut self) -> io::Result<()>;
}

/// The underlying writer a [`ResponseWriter`] decorates.
pub trait ResponseSink: Send {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_header(&mut self, status: StatusCode);

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Discard any body written so far.
    fn truncate(&mut self);

    /// Flushing capability, when the sink has one.
    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        None
    }
}

/// In-memory sink. The whole response is handed to the engine at the end.
#[derive(Debug, Default)]
pub struct BufferedSink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseSink for BufferedSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn truncate(&mut self) {
        self.body.clear();
    }
}

/// Wraps a [`ResponseSink`] and records what was written through it.
#[derive(Debug)]
pub struct ResponseWriter<S> {
    sink: S,
    status: Option<StatusCode>,
    size: usize,
}

impl<S: ResponseSink> ResponseWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            status: None,
            size: 0,
        }
    }

    pub fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.sink.write_header(status);
    }

    /// Append `buf` to the body, setting status 200 first if none was set.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.written() {
            self.write_header(StatusCode::OK);
        }
        let n = self.sink.write(buf)?;
        self.size += n;
        Ok(n)
    }

    /// Status code of the response, 200 when nothing was written yet.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn written(&self) -> bool {
        self.status.is_some()
    }

    /// Body bytes written so far.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn flush(&mut self) -> io::Result<()> {
        if self.sink.flusher().is_none() {
            return Ok(());
        }
        if !self.written() {
            self.write_header(StatusCode::OK);
        }
        match self.sink.flusher() {
            Some(flusher) => flusher.flush(),
            None => Ok(()),
        }
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    pub fn set_content_type(&mut self, content_type: &'static str) {
        self.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    /// Drop the body written so far, keeping headers and status.
    pub fn reset_body(&mut self) {
        self.sink.truncate();
        self.size = 0;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: ResponseSink> io::Write for ResponseWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ResponseWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        ResponseWriter::flush(self)
    }
}
