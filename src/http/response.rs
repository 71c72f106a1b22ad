//! Response helpers.
//!
//! # Responsibilities
//! - Write status-only, JSON and protocol buffer responses
//! - Encode by the `Accept` header
//! - Translate errors into 500 responses
//!
//! # Design Decisions
//! - Encoding happens before anything is written, so a failed encode
//!   leaves the response untouched
//! - Content type, status and body are set in that order

use http::header::ACCEPT;
use http::StatusCode;

use crate::error::{Error, Result};
use crate::http::exchange::Exchange;
use crate::http::request;
use crate::media::{Codec, Media};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Set the status code only.
pub fn status<E: Exchange>(exchange: &mut E, code: StatusCode) -> Result<()> {
    exchange.response().write_header(code);
    Ok(())
}

pub fn json<T, E>(exchange: &mut E, code: StatusCode, value: &T) -> Result<()>
where
    T: Media,
    E: Exchange,
{
    write_encoded(exchange, Codec::Json, code, value)
}

pub fn proto_buff<T, E>(exchange: &mut E, code: StatusCode, value: &T) -> Result<()>
where
    T: Media,
    E: Exchange,
{
    write_encoded(exchange, Codec::Protobuf, code, value)
}

/// Encode `value` with the codec named by the `Accept` header.
pub fn write_by_accept<T, E>(exchange: &mut E, code: StatusCode, value: &T) -> Result<()>
where
    T: Media,
    E: Exchange,
{
    let codec = exchange
        .header(ACCEPT)
        .and_then(Codec::from_header)
        .ok_or(Error::InvalidAccept)?;
    write_encoded(exchange, codec, code, value)
}

/// Replace the response with `err` as a 500 and hand the error back.
///
/// Meant for `return Err(err(exchange, e))` at call sites.
pub fn err<E: Exchange>(exchange: &mut E, err: Error) -> Error {
    let message = err.to_string();
    let response = exchange.response();
    response.reset_body();
    response.set_content_type(TEXT_PLAIN);
    response.write_header(StatusCode::INTERNAL_SERVER_ERROR);
    if let Err(io) = response.write(message.as_bytes()) {
        tracing::warn!(error = %io, "failed to write error body");
    }
    err
}

fn write_encoded<T, E>(exchange: &mut E, codec: Codec, code: StatusCode, value: &T) -> Result<()>
where
    T: Media,
    E: Exchange,
{
    let raw = codec.encode(value)?;
    let response = exchange.response();
    response.set_content_type(codec.content_type());
    response.write_header(code);
    response.reset_body();
    response.write(&raw)?;
    Ok(())
}

/// The helpers as methods on every exchange.
pub trait Respond: Exchange + Sized {
    fn status(&mut self, code: StatusCode) -> Result<()> {
        status(self, code)
    }

    fn json<T: Media>(&mut self, code: StatusCode, value: &T) -> Result<()> {
        json(self, code, value)
    }

    fn proto_buff<T: Media>(&mut self, code: StatusCode, value: &T) -> Result<()> {
        proto_buff(self, code, value)
    }

    fn write_by_accept<T: Media>(&mut self, code: StatusCode, value: &T) -> Result<()> {
        write_by_accept(self, code, value)
    }

    fn read_by_content_type<T: Media>(&self) -> Result<T> {
        request::read_by_content_type(self)
    }

    fn err(&mut self, e: Error) -> Error {
        err(self, e)
    }
}

impl<E: Exchange> Respond for E {}
