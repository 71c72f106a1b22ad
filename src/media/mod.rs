//! Media codecs and the content-type dispatch table.
//!
//! # Data Flow
//! ```text
//! Content-Type / Accept header
//!     → Codec::from_header (substring match against CODECS, in order)
//!     → json.rs (serde_json) | proto.rs (prost)
//! ```
//!
//! # Design Decisions
//! - One immutable table consulted by both read and write dispatch
//! - No quality (`q=`) parsing; the first codec whose content type is
//!   contained in the header wins
//! - Protobuf support is an optional capability of a [`Media`] value;
//!   values without it fail with [`Error::InvalidProtoMessage`]

pub mod json;
pub mod proto;

use crate::error::{Error, Result};

/// Content type of the JSON codec.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of the protocol buffer codec.
pub const PROTO_CONTENT_TYPE: &str = "application/octet-stream";

/// A content-type-associated encode/decode pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Json,
    Protobuf,
}

/// Dispatch table, in match priority order.
pub const CODECS: &[Codec] = &[Codec::Json, Codec::Protobuf];

impl Codec {
    /// Content type this codec reads and writes.
    pub const fn content_type(self) -> &'static str {
        match self {
            Codec::Json => JSON_CONTENT_TYPE,
            Codec::Protobuf => PROTO_CONTENT_TYPE,
        }
    }

    /// Select the codec whose content type is contained in `header`.
    pub fn from_header(header: &str) -> Option<Codec> {
        CODECS
            .iter()
            .copied()
            .find(|codec| header.contains(codec.content_type()))
    }

    pub fn encode<T: Media>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Json => value.marshal_json(),
            Codec::Protobuf => value.marshal_proto(),
        }
    }

    pub fn decode<T: Media>(self, raw: &[u8]) -> Result<T> {
        match self {
            Codec::Json => T::unmarshal_json(raw),
            Codec::Protobuf => T::unmarshal_proto(raw),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.content_type())
    }
}

/// A value that can travel as a request or response body.
///
/// JSON is mandatory. Protobuf is opt-in: the default methods report
/// [`Error::InvalidProtoMessage`]. Use [`json_media!`](crate::json_media) for
/// serde types and [`proto_media!`](crate::proto_media) for prost messages
/// that also derive serde.
pub trait Media: Sized {
    fn marshal_json(&self) -> Result<Vec<u8>>;

    fn unmarshal_json(raw: &[u8]) -> Result<Self>;

    fn marshal_proto(&self) -> Result<Vec<u8>> {
        Err(Error::InvalidProtoMessage)
    }

    fn unmarshal_proto(_raw: &[u8]) -> Result<Self> {
        Err(Error::InvalidProtoMessage)
    }
}

/// Implement [`Media`] with JSON support only.
#[macro_export]
macro_rules! json_media {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::media::Media for $ty {
                fn marshal_json(&self) -> $crate::Result<::std::vec::Vec<u8>> {
                    $crate::media::json::marshal_bytes(self)
                }

                fn unmarshal_json(raw: &[u8]) -> $crate::Result<Self> {
                    $crate::media::json::unmarshal_bytes(raw)
                }
            }
        )+
    };
}

/// Implement [`Media`] with both JSON and protobuf support.
#[macro_export]
macro_rules! proto_media {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::media::Media for $ty {
                fn marshal_json(&self) -> $crate::Result<::std::vec::Vec<u8>> {
                    $crate::media::json::marshal_bytes(self)
                }

                fn unmarshal_json(raw: &[u8]) -> $crate::Result<Self> {
                    $crate::media::json::unmarshal_bytes(raw)
                }

                fn marshal_proto(&self) -> $crate::Result<::std::vec::Vec<u8>> {
                    $crate::media::proto::marshal_bytes(self)
                }

                fn unmarshal_proto(raw: &[u8]) -> $crate::Result<Self> {
                    $crate::media::proto::unmarshal_bytes(raw)
                }
            }
        )+
    };
}
