//! Handlers and the wrappers composed around them.
//!
//! # Data Flow
//! ```text
//! engine adapter
//!     → LogHandler   (access log: request / response events)
//!     → ErrorHandler (handler error → 500 with the error text)
//!     → user handler
//! ```
//!
//! # Design Decisions
//! - Wrappers implement [`Handler`] themselves, so they nest freely
//! - Neither wrapper swallows the error; callers always see what the
//!   inner handler returned

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::header::AUTHORIZATION;
use http::{Request, Response};
use tracing::Instrument;

use crate::error::Result;
use crate::http::context::{bearer_token, RequestContext};
use crate::http::exchange::{BufferedExchange, Exchange};
use crate::http::response;

/// A unit of request handling.
pub trait Handler<E: Exchange>: Send + Sync {
    fn handle<'a>(&'a self, cx: &'a RequestContext, exchange: &'a mut E)
        -> BoxFuture<'a, Result<()>>;
}

impl<E, H> Handler<E> for Arc<H>
where
    E: Exchange,
    H: Handler<E> + ?Sized,
{
    fn handle<'a>(&'a self, cx: &'a RequestContext, exchange: &'a mut E) -> BoxFuture<'a, Result<()>> {
        (**self).handle(cx, exchange)
    }
}

/// Handler backed by a closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Turn a closure returning a boxed future into a [`Handler`].
///
/// ```ignore
/// let hello = handler_fn(|_cx, ex: &mut BufferedExchange| {
///     Box::pin(async move { ex.status(StatusCode::NO_CONTENT) })
/// });
/// ```
pub fn handler_fn<E, F>(f: F) -> HandlerFn<F>
where
    E: Exchange,
    F: for<'a> Fn(&'a RequestContext, &'a mut E) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    HandlerFn { f }
}

impl<E, F> Handler<E> for HandlerFn<F>
where
    E: Exchange,
    F: for<'a> Fn(&'a RequestContext, &'a mut E) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn handle<'a>(&'a self, cx: &'a RequestContext, exchange: &'a mut E) -> BoxFuture<'a, Result<()>> {
        (self.f)(cx, exchange)
    }
}

/// Translates handler errors into 500 responses.
#[derive(Clone)]
pub struct ErrorHandler<H> {
    inner: H,
}

/// Wrap `handler` with error-to-response translation.
pub fn error<H>(handler: H) -> ErrorHandler<H> {
    ErrorHandler { inner: handler }
}

impl<E, H> Handler<E> for ErrorHandler<H>
where
    E: Exchange,
    H: Handler<E>,
{
    fn handle<'a>(&'a self, cx: &'a RequestContext, exchange: &'a mut E) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self.inner.handle(cx, &mut *exchange).await {
                Ok(()) => Ok(()),
                Err(e) => Err(response::err(exchange, e)),
            }
        })
    }
}

/// Emits one access-log entry pair per request.
#[derive(Clone)]
pub struct LogHandler<H> {
    inner: H,
}

/// Wrap `handler` with access logging.
pub fn log<H>(handler: H) -> LogHandler<H> {
    LogHandler { inner: handler }
}

impl<E, H> Handler<E> for LogHandler<H>
where
    E: Exchange,
    H: Handler<E>,
{
    fn handle<'a>(&'a self, cx: &'a RequestContext, exchange: &'a mut E) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let start = Instant::now();
            let span = tracing::info_span!(
                "access",
                tid = exchange.connection_id(),
                rid = %exchange.request_id(),
                method = %exchange.method(),
                path = %exchange.path(),
                auth = "anonymous",
            );
            let child = cx.clone().with_span(span.clone());

            async {
                tracing::info!("request");
                tracing::debug!(
                    token = child.token().is_some(),
                    identity = child.identity().is_some(),
                    "context"
                );

                let result = self.inner.handle(&child, &mut *exchange).await;
                if let Err(err) = &result {
                    tracing::error!(error = %err, "handler failed");
                }

                let response = exchange.response();
                let status = response.status();
                tracing::info!(
                    status = status.canonical_reason().unwrap_or("Unknown"),
                    code = status.as_u16(),
                    size = response.size(),
                    elapsed = ?start.elapsed(),
                    "response"
                );
                result
            }
            .instrument(span)
            .await
        })
    }
}

/// The default chain engines install: `log(error(handler))`.
pub fn wrap<H>(handler: H) -> LogHandler<ErrorHandler<H>> {
    log(error(handler))
}

/// Run `handler` over a fully read request and return the response.
///
/// Engines call this once they have collected the body. The handler's error
/// is already translated and logged by the chain, so only the response
/// survives.
pub async fn dispatch(
    handler: &dyn Handler<BufferedExchange>,
    request: Request<Bytes>,
    connection_id: u64,
    request_id: String,
) -> Response<Bytes> {
    let mut cx = RequestContext::new();
    if let Some(token) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
    {
        cx = cx.with_token(token);
    }

    let mut exchange = BufferedExchange::from_request(request).with_ids(connection_id, request_id);
    if let Err(err) = handler.handle(&cx, &mut exchange).await {
        tracing::trace!(error = %err, "handler returned error");
    }
    exchange.into_response()
}
