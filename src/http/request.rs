//! Request body decoding.
//!
//! # Responsibilities
//! - Pick a codec from the `Content-Type` header
//! - Decode the buffered request body into a [`Media`] value
//!
//! # Design Decisions
//! - Missing and unknown content types are the same failure
//! - No default codec

use http::header::CONTENT_TYPE;

use crate::error::{Error, Result};
use crate::http::exchange::Exchange;
use crate::media::{Codec, Media};

/// Header carrying the request id set by the axum engine.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Decode the body with the codec named by the `Content-Type` header.
pub fn read_by_content_type<T, E>(exchange: &E) -> Result<T>
where
    T: Media,
    E: Exchange,
{
    let codec = exchange
        .header(CONTENT_TYPE)
        .and_then(Codec::from_header)
        .ok_or(Error::InvalidContentType)?;
    codec.decode(exchange.body())
}

/// Decode the body as JSON regardless of headers.
pub fn read_json<T, E>(exchange: &E) -> Result<T>
where
    T: Media,
    E: Exchange,
{
    Codec::Json.decode(exchange.body())
}

/// Decode the body as a protocol buffer message regardless of headers.
pub fn read_proto_buff<T, E>(exchange: &E) -> Result<T>
where
    T: Media,
    E: Exchange,
{
    Codec::Protobuf.decode(exchange.body())
}
