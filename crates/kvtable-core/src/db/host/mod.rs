//! Module: host
//! Responsibility: the primitive operation set of the external ordered
//! key-value store, expressed as the `KvHost` trait.
//! Does not own: typed keys/values, cursor state machines, pooling.
//!
//! Every call is scoped by a region (database) name and a collection (owner)
//! name. Keys handed to and returned from the host are the table layer's raw
//! keys; the region/collection scope is never part of them.

mod memory;


pub use memory::{MAX_HOST_KEY_BYTES, MAX_HOST_VALUE_BYTES, MemoryHost};

use crate::{db::identity::Name, error::InternalError};
use derive_more::Display;
use std::cmp::Ordering;

///
/// IteratorHandle
///
/// Opaque store-side cursor id. Must be released with
/// [`KvHost::iterator_destroy`] once no cursor uses it.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("it#{_0}")]
pub struct IteratorHandle(u32);

impl IteratorHandle {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

///
/// IteratorStatus
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum IteratorStatus {
    /// A key/value pair is present at the cursor.
    Positioned,

    /// The pair the cursor pointed at was removed after positioning.
    Erased,

    /// Out of bounds; no pair.
    End,
}

impl IteratorStatus {
    // Wire codes used by hosts that speak integers.
    const CODE_POSITIONED: i32 = 0;
    const CODE_ERASED: i32 = -1;
    const CODE_END: i32 = -2;

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Positioned => Self::CODE_POSITIONED,
            Self::Erased => Self::CODE_ERASED,
            Self::End => Self::CODE_END,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::CODE_POSITIONED => Some(Self::Positioned),
            Self::CODE_ERASED => Some(Self::Erased),
            Self::CODE_END => Some(Self::End),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(self, Self::End)
    }
}

///
/// KvHost
///
/// Primitive store operations consumed by tables, indexes and cursors.
/// Implementations are single-threaded and synchronous; a returned error
/// aborts the table operation that issued the call.
///

pub trait KvHost {
    /// Insert or replace one pair.
    fn set(&self, region: Name, collection: Name, key: &[u8], value: &[u8])
    -> Result<(), InternalError>;

    /// Remove one pair if present.
    fn erase(&self, region: Name, collection: Name, key: &[u8]) -> Result<(), InternalError>;

    /// Size of the value stored under `key`, or `None` if absent.
    fn get(&self, region: Name, collection: Name, key: &[u8])
    -> Result<Option<u32>, InternalError>;

    /// Allocate a cursor confined to keys starting with `prefix`.
    /// A fresh cursor sits at the end sentinel.
    fn iterator_create(
        &self,
        region: Name,
        collection: Name,
        prefix: &[u8],
    ) -> Result<IteratorHandle, InternalError>;

    fn iterator_destroy(&self, it: IteratorHandle) -> Result<(), InternalError>;

    fn iterator_status(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError>;

    fn iterator_move_to_end(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError>;

    /// Position at the first key `>= key` inside the cursor's prefix.
    fn iterator_lower_bound(
        &self,
        it: IteratorHandle,
        key: &[u8],
    ) -> Result<IteratorStatus, InternalError>;

    /// Step forward. From the end sentinel this wraps to the first key.
    fn iterator_next(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError>;

    /// Step backward. From the first key this lands on the end sentinel;
    /// from the end sentinel it moves to the last key.
    fn iterator_prev(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError>;

    /// Compare the cursor's key with `key`; the end sentinel sorts last.
    fn iterator_key_compare(
        &self,
        it: IteratorHandle,
        key: &[u8],
    ) -> Result<Ordering, InternalError>;

    /// Compare two cursors over the same scope; the end sentinel sorts last.
    fn iterator_compare(
        &self,
        a: IteratorHandle,
        b: IteratorHandle,
    ) -> Result<Ordering, InternalError>;

    /// Copy key bytes starting at `offset` into `dest`.
    /// Returns the status and the full key length. An `Erased` iterator may
    /// still report the key it sat on; a length of 0 means it does not.
    fn read_key(
        &self,
        it: IteratorHandle,
        offset: u32,
        dest: &mut [u8],
    ) -> Result<(IteratorStatus, u32), InternalError>;

    /// Copy value bytes starting at `offset` into `dest`.
    /// Returns the status and the full value length.
    fn read_value(
        &self,
        it: IteratorHandle,
        offset: u32,
        dest: &mut [u8],
    ) -> Result<(IteratorStatus, u32), InternalError>;
}
