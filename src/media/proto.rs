//! Protocol buffer codec backed by `prost`.

use std::io::{Read, Write};

use prost::Message;

use crate::error::{Error, Result};

/// Encode `msg` onto `writer`.
pub fn marshal<W, M>(writer: &mut W, msg: &M) -> Result<()>
where
    W: Write,
    M: Message,
{
    let raw = marshal_bytes(msg)?;
    writer.write_all(&raw)?;
    Ok(())
}

/// Read `reader` to the end and decode it. An empty stream is an error.
pub fn unmarshal<R, M>(mut reader: R) -> Result<M>
where
    R: Read,
    M: Message + Default,
{
    let mut raw = Vec::new();
    if reader.read_to_end(&mut raw)? == 0 {
        return Err(Error::EmptyInput);
    }
    unmarshal_bytes(&raw)
}

pub fn marshal_bytes<M>(msg: &M) -> Result<Vec<u8>>
where
    M: Message,
{
    let mut raw = Vec::with_capacity(msg.encoded_len());
    msg.encode(&mut raw)?;
    tracing::debug!(len = raw.len(), "proto marshal");
    Ok(raw)
}

pub fn unmarshal_bytes<M>(raw: &[u8]) -> Result<M>
where
    M: Message + Default,
{
    let decoded = M::decode(raw);
    tracing::debug!(
        len = raw.len(),
        error = decoded.as_ref().err().map(tracing::field::display),
        "proto unmarshal"
    );
    Ok(decoded?)
}
