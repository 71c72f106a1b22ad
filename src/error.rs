//! Error types shared by the codecs, the response helpers and the wrappers.

use thiserror::Error;

/// Boxed error raised by user handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid content type")]
    InvalidContentType,

    #[error("invalid accept")]
    InvalidAccept,

    #[error("invalid proto message value")]
    InvalidProtoMessage,

    #[error("the provided input (reader, bytes) is empty")]
    EmptyInput,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("proto decode: {0}")]
    ProtoDecode(#[from] prost::DecodeError),

    #[error("proto encode: {0}")]
    ProtoEncode(#[from] prost::EncodeError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("request body: {0}")]
    Body(String),

    #[error("{0}")]
    Handler(BoxError),
}

impl Error {
    /// Wrap an arbitrary handler error.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Handler(err.into())
    }

    /// Handler error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Error::Handler(message.into())
    }
}
