//! Handler wrappers and content negotiation for HTTP services.
//!
//! A user handler is wrapped as `log(error(handler))` and served by either
//! engine. Inside the handler, bodies are decoded by `Content-Type` and
//! encoded by `Accept` through one codec table (JSON or protocol buffers).

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod media;
pub mod net;
pub mod observability;

#[cfg(test)]
mod test_support;

pub use config::HakiConfig;
pub use error::{BoxError, Error, Result};
pub use crate::http::{AxumServer, BufferedExchange, Exchange, Handler, HyperServer, RequestContext, Respond};
pub use lifecycle::Shutdown;
pub use media::{Codec, Media};
