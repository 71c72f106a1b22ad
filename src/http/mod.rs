//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! engine (server.rs: axum | hyper_server.rs: hyper)
//!     → body collected, BufferedExchange built (exchange.rs)
//!     → handler.rs: log → error → user handler
//!         → request.rs (decode by Content-Type)
//!         → response.rs (encode by Accept, status, errors)
//!         → writer.rs (status / size bookkeeping)
//!     → exchange converted back into the engine's response
//! ```

pub mod context;
pub mod exchange;
pub mod handler;
pub mod hyper_server;
pub mod request;
pub mod response;
pub mod server;
pub mod writer;

pub use context::{setup, Auditor, Identity, RequestContext};
pub use exchange::{BufferedExchange, Exchange};
pub use handler::{error, handler_fn, log, wrap, ErrorHandler, Handler, HandlerFn, LogHandler};
pub use hyper_server::HyperServer;
pub use request::{read_by_content_type, read_json, read_proto_buff, X_REQUEST_ID};
pub use response::{err, json, proto_buff, status, write_by_accept, Respond};
pub use server::{endpoint, AxumServer};
pub use writer::{BufferedSink, Flush, ResponseSink, ResponseWriter};
