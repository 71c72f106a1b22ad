//! JSON codec backed by `serde_json`.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encode `value` onto `writer`, followed by a newline.
pub fn marshal<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Decode one JSON value from `reader`.
pub fn unmarshal<R, T>(reader: R) -> Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    Ok(serde_json::from_reader(reader)?)
}

pub fn marshal_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_vec(value);
    tracing::debug!(
        len = encoded.as_ref().map(Vec::len).unwrap_or_default(),
        error = encoded.as_ref().err().map(tracing::field::display),
        "json marshal"
    );
    Ok(encoded?)
}

pub fn unmarshal_bytes<T>(raw: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let decoded = serde_json::from_slice(raw);
    tracing::debug!(
        len = raw.len(),
        error = decoded.as_ref().err().map(tracing::field::display),
        "json unmarshal"
    );
    Ok(decoded?)
}
