use crate::serialize::SerializeError;
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec, to_writer};
use std::{
    io,
    panic::{AssertUnwindSafe, catch_unwind},
};

///
/// ByteCounter
/// Writer that keeps only the number of bytes written.
///

#[derive(Default)]
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serialize a value into CBOR bytes.
pub(super) fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Serialize a value as CBOR into `writer`.
pub(super) fn serialize_into<T, W>(t: &T, writer: W) -> Result<(), SerializeError>
where
    T: Serialize,
    W: io::Write,
{
    to_writer(writer, t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Exact CBOR length of a value.
pub(super) fn serialized_size<T>(t: &T) -> Result<usize, SerializeError>
where
    T: Serialize,
{
    let mut counter = ByteCounter::default();
    to_writer(&mut counter, t).map_err(|e| SerializeError::Serialize(e.to_string()))?;

    Ok(counter.0)
}

/// Deserialize CBOR bytes into a value.
///
/// Any panic during decode is caught and reported as a deserialize error.
pub(super) fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    let result = catch_unwind(AssertUnwindSafe(|| from_slice(bytes)));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

/// Deserialize CBOR bytes into a value, rejecting oversized input up front.
pub(super) fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > max_bytes {
        return Err(SerializeError::DeserializeSizeLimitExceeded {
            len: bytes.len(),
            max_bytes,
        });
    }

    deserialize(bytes)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Sample {
        id: u64,
        label: String,
        tags: Vec<String>,
    }

    fn sample() -> Sample {
        Sample {
            id: 7,
            label: "seven".into(),
            tags: vec!["a".into(), "bb".into()],
        }
    }

    #[test]
    fn serialized_size_matches_encoded_length() {
        let value = sample();
        let bytes = serialize(&value).expect("serialize");

        assert_eq!(serialized_size(&value).expect("size"), bytes.len());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = serialize(&sample()).expect("serialize");
        bytes.push(0);

        let err = deserialize::<Sample>(&bytes).unwrap_err();
        assert!(matches!(err, SerializeError::Deserialize(_)));
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let bytes = serialize(&sample()).expect("serialize");

        let err = deserialize::<Sample>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, SerializeError::Deserialize(_)));
    }

    #[test]
    fn bounded_decode_rejects_oversized_payload() {
        let bytes = serialize(&sample()).expect("serialize");

        let err = deserialize_bounded::<Sample>(&bytes, bytes.len() - 1).unwrap_err();
        assert!(matches!(
            err,
            SerializeError::DeserializeSizeLimitExceeded { .. }
        ));
    }
}
