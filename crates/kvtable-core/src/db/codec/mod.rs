//! Module: codec
//! Responsibility: packing typed keys and record values into store bytes.
//! Does not own: format-level CBOR details (see `crate::serialize`).
//!
//! Invariants:
//! - Key packing is deterministic and total.
//! - For any two keys `a < b`, `a.pack() < b.pack()` byte-lexicographically.
//! - `unpack` fails closed on any length or shape mismatch.
//! - `packed_size` is exact and computed without building the encoding.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        buffer::PackedBuffer,
        identity::{Name, NameError},
    },
    error::InternalError,
    serialize::{SerializeError, deserialize_bounded, serialize_into, serialized_size},
};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use thiserror::Error as ThisError;
use ulid::Ulid;

///
/// DecodeError
///

#[derive(Debug, ThisError)]
pub enum DecodeError {
    #[error("expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("expected at least {min} bytes, found {found}")]
    Truncated { min: usize, found: usize },

    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),

    #[error("key bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid name: {0}")]
    Name(#[from] NameError),

    #[error("invalid value: {0}")]
    Value(#[from] SerializeError),
}

impl From<DecodeError> for InternalError {
    fn from(err: DecodeError) -> Self {
        Self::decode(err.to_string())
    }
}

///
/// KeyCodec
///
/// Order-preserving packing for primary keys.
///

pub trait KeyCodec: Clone + Debug + Ord + Sized {
    /// Exact number of bytes `pack_into` appends.
    fn packed_size(&self) -> usize;

    /// Append the packed form to `out`.
    fn pack_into(&self, out: &mut PackedBuffer);

    /// Decode a key from exactly the bytes `pack_into` produced.
    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError>;

    /// Pack into a buffer sized up front.
    fn pack(&self) -> PackedBuffer {
        let mut out = PackedBuffer::acquire(self.packed_size());
        self.pack_into(&mut out);
        debug_assert_eq!(out.len(), self.packed_size(), "packed_size is not exact");

        out
    }
}

///
/// FixedWidthKey
///
/// Keys whose packed form always has the same length. Only these may lead a
/// composite key, so the split point is known when unpacking.
///

pub trait FixedWidthKey: KeyCodec {
    const WIDTH: usize;
}

// Fail unless `bytes` is exactly `N` long.
fn exact<const N: usize>(bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes.try_into().map_err(|_| DecodeError::InvalidLength {
        expected: N,
        found: bytes.len(),
    })
}

macro_rules! impl_unsigned_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl KeyCodec for $ty {
                fn packed_size(&self) -> usize {
                    size_of::<$ty>()
                }

                fn pack_into(&self, out: &mut PackedBuffer) {
                    out.extend_from_slice(&self.to_be_bytes());
                }

                fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
                    Ok(<$ty>::from_be_bytes(exact(bytes)?))
                }
            }

            impl FixedWidthKey for $ty {
                const WIDTH: usize = size_of::<$ty>();
            }
        )*
    };
}

// Flip the sign bit so negative values sort before positive ones.
macro_rules! impl_signed_key {
    ($($ty:ty => $uty:ty),* $(,)?) => {
        $(
            impl KeyCodec for $ty {
                fn packed_size(&self) -> usize {
                    size_of::<$ty>()
                }

                fn pack_into(&self, out: &mut PackedBuffer) {
                    let biased = self.cast_unsigned() ^ (1 << (<$uty>::BITS - 1));
                    out.extend_from_slice(&biased.to_be_bytes());
                }

                fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
                    let biased = <$uty>::from_be_bytes(exact(bytes)?);
                    Ok((biased ^ (1 << (<$uty>::BITS - 1))).cast_signed())
                }
            }

            impl FixedWidthKey for $ty {
                const WIDTH: usize = size_of::<$ty>();
            }
        )*
    };
}

impl_unsigned_key!(u8, u16, u32, u64, u128);
impl_signed_key!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128);

impl KeyCodec for bool {
    fn packed_size(&self) -> usize {
        1
    }

    fn pack_into(&self, out: &mut PackedBuffer) {
        out.push(u8::from(*self));
    }

    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        match exact::<1>(bytes)? {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(DecodeError::InvalidBool(other)),
        }
    }
}

impl FixedWidthKey for bool {
    const WIDTH: usize = 1;
}

impl KeyCodec for Ulid {
    fn packed_size(&self) -> usize {
        16
    }

    fn pack_into(&self, out: &mut PackedBuffer) {
        out.extend_from_slice(&self.to_bytes());
    }

    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::from_bytes(exact(bytes)?))
    }
}

impl FixedWidthKey for Ulid {
    const WIDTH: usize = 16;
}

impl KeyCodec for Name {
    fn packed_size(&self) -> usize {
        Self::STORED_LEN
    }

    fn pack_into(&self, out: &mut PackedBuffer) {
        out.extend_from_slice(&self.to_bytes());
    }

    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::from_bytes(bytes)?)
    }
}

impl FixedWidthKey for Name {
    const WIDTH: usize = Self::STORED_LEN;
}

// Variable-width keys take the rest of the key bytes, so they may only appear
// last in a composite key.
impl KeyCodec for String {
    fn packed_size(&self) -> usize {
        self.len()
    }

    fn pack_into(&self, out: &mut PackedBuffer) {
        out.extend_from_slice(self.as_bytes());
    }

    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        std::str::from_utf8(bytes)
            .map(ToString::to_string)
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}

impl KeyCodec for Vec<u8> {
    fn packed_size(&self) -> usize {
        self.len()
    }

    fn pack_into(&self, out: &mut PackedBuffer) {
        out.extend_from_slice(self);
    }

    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(bytes.to_vec())
    }
}

impl<A, B> KeyCodec for (A, B)
where
    A: FixedWidthKey,
    B: KeyCodec,
{
    fn packed_size(&self) -> usize {
        A::WIDTH + self.1.packed_size()
    }

    fn pack_into(&self, out: &mut PackedBuffer) {
        self.0.pack_into(out);
        self.1.pack_into(out);
    }

    fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < A::WIDTH {
            return Err(DecodeError::Truncated {
                min: A::WIDTH,
                found: bytes.len(),
            });
        }
        let (head, tail) = bytes.split_at(A::WIDTH);

        Ok((A::unpack(head)?, B::unpack(tail)?))
    }
}

impl<A, B> FixedWidthKey for (A, B)
where
    A: FixedWidthKey,
    B: FixedWidthKey,
{
    const WIDTH: usize = A::WIDTH + B::WIDTH;
}

// ---------------------------------------------------------------------------
// Record values
// ---------------------------------------------------------------------------

/// Exact packed size of one record value.
pub fn value_packed_size<T: Serialize>(value: &T) -> Result<usize, InternalError> {
    Ok(serialized_size(value)?)
}

/// Pack one record value into a buffer sized up front.
pub fn pack_value<T: Serialize>(value: &T) -> Result<PackedBuffer, InternalError> {
    let size = value_packed_size(value)?;
    let mut out = PackedBuffer::acquire(size);
    serialize_into(value, &mut out)?;

    if out.len() != size {
        return Err(InternalError::serialize_internal(format!(
            "value packed to {} bytes, expected {size}",
            out.len()
        )));
    }

    Ok(out)
}

/// Decode one record value, rejecting payloads above `max_bytes`.
pub fn unpack_value<T: DeserializeOwned>(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<T, InternalError> {
    deserialize_bounded(bytes, max_bytes)
        .map_err(|source| DecodeError::Value(source).into())
}
