//! Message envelope
//!
//! The canonical payload published per eligible request. Wire shape is a
//! JSON map with exactly the keys `id`, `path` and `metadata`; downstream
//! consumers key on them and must tolerate unknown keys, but this side
//! adds none.

use crate::policy::FilteredHeaders;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure decoding an envelope id back into its path
#[derive(Error, Debug)]
pub enum IdDecodeError {
    #[error("id is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded path is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The message published per eligible request.
///
/// Built once, handed to the publisher, and forgotten: the envelope has
/// no further lifecycle on this side of the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 encoding of `path`. Stable for identical paths, so
    /// consumers can use it for correlation and deduplication; it is not
    /// a uniqueness guarantee across the system.
    pub id: String,

    /// Resource path of the intercepted request, verbatim
    pub path: String,

    /// Headers admitted by the allow policy
    pub metadata: FilteredHeaders,
}

impl Envelope {
    /// Build the envelope for a request.
    ///
    /// Deterministic: identical `(path, metadata)` always produce an
    /// identical envelope. The path is trusted as-is; no well-formedness
    /// checks are performed.
    pub fn build(path: impl Into<String>, metadata: FilteredHeaders) -> Self {
        let path = path.into();
        Self {
            id: encode_id(&path),
            path,
            metadata,
        }
    }

    /// Serialize to JSON wire bytes
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    /// Deserialize from wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Encode a resource path into an envelope id
pub fn encode_id(path: &str) -> String {
    BASE64.encode(path.as_bytes())
}

/// Decode an envelope id back to the exact original path
pub fn decode_id(id: &str) -> Result<String, IdDecodeError> {
    Ok(String::from_utf8(BASE64.decode(id)?)?)
}
