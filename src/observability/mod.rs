//! Observability subsystem.
//!
//! Access logs are emitted by the log wrapper in `http::handler`; this
//! module only installs the subscriber that renders them.

pub mod logging;
