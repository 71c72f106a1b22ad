//! Shared utilities for engine integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use haki::config::{Engine, HakiConfig, ListenerConfig};
use haki::http::{handler_fn, BufferedExchange};
use haki::net::Listener;
use haki::{AxumServer, Exchange, Handler, HyperServer, Respond, Shutdown};
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Account {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(int32, tag = "2")]
    #[serde(default)]
    pub age: i32,
}

haki::proto_media!(Account);

/// Echo handler: decode by Content-Type, encode by Accept.
/// `/fail` returns an error, `/redirect` only sets a status.
pub fn account_handler() -> impl Handler<BufferedExchange> {
    handler_fn(|_cx, ex: &mut BufferedExchange| {
        Box::pin(async move {
            let path = ex.path().to_owned();
            match path.as_str() {
                "/fail" => Err(haki::Error::msg("MockErr")),
                "/redirect" => ex.status(StatusCode::FOUND),
                "/whoami" => {
                    let body = format!("{} {}", ex.connection_id(), ex.request_id());
                    ex.response().write(body.as_bytes())?;
                    Ok(())
                }
                _ => {
                    let account: Account = ex.read_by_content_type()?;
                    ex.write_by_accept(StatusCode::CREATED, &account)
                }
            }
        })
    })
}

/// Start `engine` on an ephemeral port. The server stops when the
/// returned `Shutdown` is triggered.
pub async fn start_server(engine: Engine) -> (SocketAddr, Shutdown) {
    start_configured(engine, |_| {}).await
}

/// Like [`start_server`], with `configure` applied to the config first.
pub async fn start_configured<F>(engine: Engine, configure: F) -> (SocketAddr, Shutdown)
where
    F: FnOnce(&mut HakiConfig),
{
    let mut config = HakiConfig {
        engine,
        listener: ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            max_connections: 16,
        },
        ..HakiConfig::default()
    };
    configure(&mut config);

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    match engine {
        Engine::Axum => {
            let server = AxumServer::new(account_handler(), config);
            tokio::spawn(server.run(listener.into_tcp(), rx));
        }
        Engine::Hyper => {
            let server = HyperServer::new(account_handler(), config);
            tokio::spawn(server.run(listener, rx));
        }
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
