//! hyper engine.
//!
//! # Responsibilities
//! - Accept connections through the bounded listener
//! - Number connections and the requests on each of them
//! - Serve HTTP/1.1 with the wrapped handler
//! - Close idle connections and drain busy ones on shutdown
//!
//! # Design Decisions
//! - The request id is the request's sequence number on its connection
//! - Accept errors are logged and the loop keeps running

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::sync::broadcast;

use crate::config::HakiConfig;
use crate::error::Error;
use crate::http::exchange::BufferedExchange;
use crate::http::handler::{dispatch, wrap, Handler};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionTracker, Listener, ListenerError};

/// HTTP server running handlers directly on hyper connections.
pub struct HyperServer {
    handler: Arc<dyn Handler<BufferedExchange>>,
    config: HakiConfig,
}

impl HyperServer {
    pub fn new<H>(handler: H, config: HakiConfig) -> Self
    where
        H: Handler<BufferedExchange> + 'static,
    {
        Self {
            handler: Arc::new(wrap(handler)),
            config,
        }
    }

    /// Accept connections until `shutdown_rx` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, engine = "hyper", "HTTP server starting");

        let tracker = ConnectionTracker::new();
        let closing = Shutdown::new();
        let body_limit = self.config.limits.body_limit_bytes;

        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = shutdown_rx.recv() => break,
            };

            let (stream, peer_addr, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Accept(e)) => {
                    tracing::warn!(error = %e, "Accept failed");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let guard = tracker.track();
            let connection_id = guard.id();
            let handler = Arc::clone(&self.handler);
            let requests = Arc::new(AtomicU64::new(0));
            let mut close_rx = closing.subscribe();

            tokio::spawn(async move {
                let _permit = permit;
                let _guard = guard;

                let service = service_fn(move |request: Request<Incoming>| {
                    let handler = Arc::clone(&handler);
                    let request_num = requests.fetch_add(1, Ordering::Relaxed) + 1;
                    async move {
                        let response = serve(
                            handler.as_ref(),
                            request,
                            connection_id.as_u64(),
                            request_num,
                            body_limit,
                        )
                        .await;
                        Ok::<_, Infallible>(response)
                    }
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                tokio::pin!(conn);

                let result = tokio::select! {
                    result = &mut conn => result,
                    _ = close_rx.recv() => {
                        conn.as_mut().graceful_shutdown();
                        conn.await
                    }
                };
                if let Err(e) = result {
                    tracing::debug!(
                        connection_id = %connection_id,
                        peer_addr = %peer_addr,
                        error = %e,
                        "Connection error"
                    );
                }
            });
        }

        closing.trigger();
        let deadline = Duration::from_secs(self.config.limits.drain_timeout_secs);
        if !tracker.drain(deadline).await {
            tracing::warn!(
                open_connections = tracker.active_count(),
                "Drain deadline passed with connections still open"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &HakiConfig {
        &self.config
    }
}

async fn serve(
    handler: &dyn Handler<BufferedExchange>,
    request: Request<Incoming>,
    connection_id: u64,
    request_num: u64,
    body_limit: usize,
) -> Response<Full<Bytes>> {
    let (parts, body) = request.into_parts();
    let body = match Limited::new(body, body_limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = Error::Body(e.to_string());
            tracing::warn!(connection_id, request_num, error = %err, "Rejecting request");
            let mut response = Response::new(Full::new(Bytes::from(err.to_string())));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return response;
        }
    };

    let request = Request::from_parts(parts, body);
    dispatch(handler, request, connection_id, request_num.to_string())
        .await
        .map(Full::new)
}
