//! haki demo server.
//!
//! Serves a small echo service through the full handler chain on the
//! engine picked by config or `--engine`:
//!
//! - `GET /health` → 204
//! - `POST /echo` → body decoded by `Content-Type`, echoed by `Accept`
//! - anything else → 404

use std::path::PathBuf;

use clap::Parser;
use haki::config::{load_config, Engine, HakiConfig};
use haki::http::{handler_fn, BufferedExchange};
use haki::lifecycle::signals::shutdown_on_signal;
use haki::net::Listener;
use haki::observability::logging;
use haki::{AxumServer, Exchange, HyperServer, Respond, Shutdown};
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "haki", about = "Content-negotiating echo server")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured engine.
    #[arg(short, long, value_enum)]
    engine: Option<Engine>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
struct Note {
    #[prost(string, tag = "1")]
    text: String,
}

haki::proto_media!(Note);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HakiConfig::default(),
    };
    if let Some(engine) = cli.engine {
        config.engine = engine;
    }

    logging::init(&config.logging);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        engine = ?config.engine,
        body_limit_bytes = config.limits.body_limit_bytes,
        "Configuration loaded"
    );

    let handler = handler_fn(|_cx, ex: &mut BufferedExchange| {
        Box::pin(async move {
            let method = ex.method().clone();
            let path = ex.path().to_owned();
            match (method.as_str(), path.as_str()) {
                ("GET", "/health") => ex.status(StatusCode::NO_CONTENT),
                ("POST", "/echo") => {
                    let note: Note = ex.read_by_content_type()?;
                    ex.write_by_accept(StatusCode::OK, &note)
                }
                _ => ex.status(StatusCode::NOT_FOUND),
            }
        })
    });

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let listener = Listener::bind(&config.listener).await?;
    match config.engine {
        Engine::Axum => {
            let listener = listener.into_tcp();
            AxumServer::new(handler, config)
                .run(listener, shutdown.subscribe())
                .await?;
        }
        Engine::Hyper => {
            HyperServer::new(handler, config)
                .run(listener, shutdown.subscribe())
                .await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
