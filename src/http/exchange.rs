//! The request/response capability both engines expose to handlers.
//!
//! # Responsibilities
//! - Read-only view of the request (method, path, headers, buffered body)
//! - Correlation ids for access logs
//! - Mutable access to the decorated response writer
//!
//! # Design Decisions
//! - Bodies are buffered before the handler runs, so codec dispatch is sync
//! - Each engine adapter only converts into and out of [`BufferedExchange`]

use bytes::Bytes;
use http::header::AsHeaderName;
use http::{HeaderMap, Method, Request, Response};

use crate::http::writer::{BufferedSink, ResponseSink, ResponseWriter};

/// One request/response pair as seen by a handler.
pub trait Exchange: Send {
    type Sink: ResponseSink;

    fn method(&self) -> &Method;

    fn path(&self) -> &str;

    fn headers(&self) -> &HeaderMap;

    /// Request body, fully read.
    fn body(&self) -> &[u8];

    /// Id of the connection that carried the request, 0 when unknown.
    fn connection_id(&self) -> u64;

    fn request_id(&self) -> &str;

    fn response(&mut self) -> &mut ResponseWriter<Self::Sink>;

    /// Header value as text; missing or non-ASCII values read as `None`.
    fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

/// Exchange with an in-memory body and response, shared by every engine.
#[derive(Debug)]
pub struct BufferedExchange {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    connection_id: u64,
    request_id: String,
    response: ResponseWriter<BufferedSink>,
}

impl BufferedExchange {
    /// Build from a request whose body is already collected.
    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            body,
            connection_id: 0,
            request_id: String::new(),
            response: ResponseWriter::new(BufferedSink::new()),
        }
    }

    pub fn with_ids(mut self, connection_id: u64, request_id: impl Into<String>) -> Self {
        self.connection_id = connection_id;
        self.request_id = request_id.into();
        self
    }

    /// Finish the exchange into an HTTP response.
    pub fn into_response(self) -> Response<Bytes> {
        let (status, headers, body) = self.response.into_sink().into_parts();
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl Exchange for BufferedExchange {
    type Sink = BufferedSink;

    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn connection_id(&self) -> u64 {
        self.connection_id
    }

    fn request_id(&self) -> &str {
        &self.request_id
    }

    fn response(&mut self) -> &mut ResponseWriter<BufferedSink> {
        &mut self.response
    }
}
