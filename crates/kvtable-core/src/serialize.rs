mod cbor;

use crate::error::InternalError;
use serde::{Serialize, de::DeserializeOwned};
use std::io;
use thiserror::Error as ThisError;

/// Generic CBOR serialization infrastructure.
///
/// This module is format-level only:
/// - No table-layer limits are defined here.
/// - Callers that need bounded decode must pass explicit limits.
/// - Table-specific decode policy belongs in `db::codec`.

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("deserialize size limit exceeded: {len} bytes (limit {max_bytes})")]
    DeserializeSizeLimitExceeded { len: usize, max_bytes: usize },
}

impl From<SerializeError> for InternalError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Serialize(_) => Self::serialize_internal(err.to_string()),
            SerializeError::Deserialize(_)
            | SerializeError::DeserializeSizeLimitExceeded { .. } => Self::decode(err.to_string()),
        }
    }
}

/// Serialize a value into a fresh CBOR byte vector.
pub fn serialize<T>(ty: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    cbor::serialize(ty)
}

/// Serialize a value into an existing writer.
pub fn serialize_into<T, W>(ty: &T, writer: W) -> Result<(), SerializeError>
where
    T: Serialize,
    W: io::Write,
{
    cbor::serialize_into(ty, writer)
}

/// Count the bytes [`serialize`] would produce, without allocating them.
pub fn serialized_size<T>(ty: &T) -> Result<usize, SerializeError>
where
    T: Serialize,
{
    cbor::serialized_size(ty)
}

/// Deserialize a value produced by [`serialize`].
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize(bytes)
}

/// Deserialize a value produced by [`serialize`], with an explicit size limit.
///
/// Size limits are caller policy, not serialization-format policy.
pub fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize_bounded(bytes, max_bytes)
}
