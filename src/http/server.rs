//! axum engine.
//!
//! # Responsibilities
//! - Expose a wrapped handler as an axum route
//! - Wire up middleware (request ID, timeout)
//! - Serve with connection ids and graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::HakiConfig;
use crate::error::Error;
use crate::http::exchange::BufferedExchange;
use crate::http::handler::{dispatch, wrap, Handler};
use crate::http::request::X_REQUEST_ID;
use crate::lifecycle::shutdown;
use crate::net::ConnectionMeta;

/// Route serving `handler` behind the default `log(error(..))` chain.
pub fn endpoint<H>(handler: H, body_limit: usize) -> MethodRouter
where
    H: Handler<BufferedExchange> + 'static,
{
    let handler: Arc<dyn Handler<BufferedExchange>> = Arc::new(wrap(handler));
    any(move |request: Request| {
        let handler = Arc::clone(&handler);
        async move { serve(handler.as_ref(), request, body_limit).await }
    })
}

async fn serve(
    handler: &dyn Handler<BufferedExchange>,
    request: Request,
    body_limit: usize,
) -> Response {
    let connection_id = request
        .extensions()
        .get::<ConnectInfo<ConnectionMeta>>()
        .map(|ConnectInfo(meta)| meta.id.as_u64())
        .unwrap_or_default();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = Error::Body(e.to_string());
            tracing::warn!(request_id = %request_id, error = %err, "Rejecting request");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let request = axum::http::Request::from_parts(parts, body);
    dispatch(handler, request, connection_id, request_id)
        .await
        .map(Body::from)
}

/// HTTP server running handlers on axum.
pub struct AxumServer {
    router: Router,
    config: HakiConfig,
}

impl AxumServer {
    /// Serve `handler` for every path.
    pub fn new<H>(handler: H, config: HakiConfig) -> Self
    where
        H: Handler<BufferedExchange> + 'static,
    {
        let router = Router::new().fallback_service(endpoint(handler, config.limits.body_limit_bytes));
        Self::with_router(router, config)
    }

    /// Serve a router built from [`endpoint`]s.
    pub fn with_router(router: Router, config: HakiConfig) -> Self {
        let router = Self::layered(router, &config);
        Self { router, config }
    }

    /// Add the middleware stack around `router`.
    ///
    /// The timeout sits outside the handler chain: a timed-out request is
    /// answered with 408 and its access log has no `response` entry.
    pub fn layered(router: Router, config: &HakiConfig) -> Router {
        #[allow(deprecated)]
        let timeout = TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs));
        router
            .layer(timeout)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, engine = "axum", "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<ConnectionMeta>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &HakiConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::handler_fn;
    use crate::http::response::Respond;
    use crate::media::fixtures::User;
    use crate::test_support::{capture_events, CapturedEvents};
    use crate::Exchange;
    use axum::http::header::{ACCEPT, CONTENT_TYPE};
    use tower::ServiceExt;

    fn echo() -> impl Handler<BufferedExchange> {
        handler_fn(|_cx, ex: &mut BufferedExchange| {
            Box::pin(async move {
                let user: User = ex.read_by_content_type()?;
                ex.write_by_accept(StatusCode::OK, &user)
            })
        })
    }

    async fn body_of(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn echoes_json_through_the_chain() {
        let server = AxumServer::new(echo(), HakiConfig::default());
        let request = axum::http::Request::post("/users")
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Body::from(r#"{"username":"mock"}"#))
            .unwrap();

        let response = server.router().clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_of(response).await, br#"{"username":"mock","age":0}"#);
    }

    #[tokio::test]
    async fn dispatch_failure_becomes_500() {
        let server = AxumServer::new(echo(), HakiConfig::default());
        let request = axum::http::Request::post("/users")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("username=mock"))
            .unwrap();

        let response = server.router().clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, b"invalid content type");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_the_handler() {
        let mut config = HakiConfig::default();
        config.limits.body_limit_bytes = 4;
        let server = AxumServer::new(echo(), config);
        let request = axum::http::Request::post("/users")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"mock"}"#))
            .unwrap();

        let response = server.router().clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn timed_out_request_gets_408_without_response_entry() {
        let events = CapturedEvents::default();
        let mut config = HakiConfig::default();
        config.limits.request_timeout_secs = 1;
        let slow = handler_fn(|_cx, ex: &mut BufferedExchange| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                ex.status(StatusCode::OK)
            })
        });
        let server = AxumServer::new(slow, config);
        let request = axum::http::Request::get("/slow").body(Body::empty()).unwrap();

        let response = {
            let _guard = capture_events(&events);
            server.router().clone().oneshot(request).await.unwrap()
        };

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(events.count("request"), 1);
        assert_eq!(events.count("response"), 0);
    }

    #[tokio::test]
    async fn incoming_request_id_reaches_the_handler() {
        let handler = handler_fn(|_cx, ex: &mut BufferedExchange| {
            Box::pin(async move {
                let rid = ex.request_id().to_string();
                ex.response().write(rid.as_bytes())?;
                Ok(())
            })
        });
        let router = AxumServer::layered(
            Router::new().route("/id", endpoint(handler, 1024)),
            &HakiConfig::default(),
        );
        let request = axum::http::Request::get("/id")
            .header(X_REQUEST_ID, "req-42")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "req-42");
        assert_eq!(body_of(response).await, b"req-42");
    }
}
