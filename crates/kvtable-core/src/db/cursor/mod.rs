//! Module: cursor
//! Responsibility: typed navigation over one store iterator handle.
//! Does not own: handle allocation or pooling (see `db::index`).
//!
//! Invariants:
//! - A cursor owns its handle exclusively until it is released or dropped.
//! - `next` on an `End` cursor and `prev` past the first key are errors.
//! - `key()` re-reads the store on every call while `Positioned`; the decoded
//!   key is cached so an `Erased` cursor can still report where it was.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        buffer::PackedBuffer,
        codec::unpack_value,
        host::{IteratorHandle, IteratorStatus, KvHost},
        index::Index,
    },
    error::InternalError,
    traits::Record,
};
use std::{cell::RefCell, cmp::Ordering, fmt};

///
/// Cursor
///
/// A position in one index's key space with a tri-state status. Obtained
/// from `Index::find`, `begin`, `end`, `lower_bound` and `upper_bound`.
///

pub struct Cursor<'i, 'h, H: KvHost, R: Record> {
    index: &'i Index<'h, H, R>,
    handle: Option<IteratorHandle>,
    key: RefCell<Option<R::Key>>,
}

impl<'i, 'h, H: KvHost, R: Record> Cursor<'i, 'h, H, R> {
    pub(crate) const fn new(index: &'i Index<'h, H, R>, handle: IteratorHandle) -> Self {
        Self {
            index,
            handle: Some(handle),
            key: RefCell::new(None),
        }
    }

    pub(crate) fn handle(&self) -> Result<IteratorHandle, InternalError> {
        self.handle
            .ok_or_else(|| InternalError::host_invariant("cursor handle already released"))
    }

    /// Current status as reported by the store.
    pub fn status(&self) -> Result<IteratorStatus, InternalError> {
        let host = self.index.host()?;

        host.iterator_status(self.handle()?)
    }

    pub fn is_end(&self) -> Result<bool, InternalError> {
        Ok(self.status()?.is_end())
    }

    /// Advance one position. Fails if the cursor is already at the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<IteratorStatus, InternalError> {
        let host = self.index.host()?;
        let handle = self.handle()?;

        if host.iterator_status(handle)?.is_end() {
            return Err(InternalError::invalid_iterator_op(
                "next",
                "cursor is already at the end",
            ));
        }

        self.key.replace(None);
        host.iterator_next(handle)
    }

    /// Step back one position. From the end sentinel this moves to the last
    /// key; moving before the first key fails.
    pub fn prev(&mut self) -> Result<IteratorStatus, InternalError> {
        let host = self.index.host()?;
        let handle = self.handle()?;

        self.key.replace(None);
        let status = host.iterator_prev(handle)?;
        if status.is_end() {
            return Err(InternalError::invalid_iterator_op(
                "prev",
                "cannot move before the first element",
            ));
        }

        Ok(status)
    }

    /// Decode the key at this cursor.
    pub fn key(&self) -> Result<R::Key, InternalError> {
        let host = self.index.host()?;
        let handle = self.handle()?;

        let (status, len) = host.read_key(handle, 0, &mut [])?;
        match status {
            IteratorStatus::Positioned => self.read_key_bytes(len),
            IteratorStatus::Erased => {
                if let Some(key) = self.key.borrow().clone() {
                    return Ok(key);
                }
                if len == 0 {
                    return Err(InternalError::invalid_iterator_op(
                        "key",
                        "pair was erased before it was read",
                    ));
                }

                self.read_key_bytes(len)
            }
            IteratorStatus::End => Err(InternalError::invalid_iterator_op(
                "key",
                "cursor is at the end",
            )),
        }
    }

    // Read `len` key bytes from the store, decode and cache them.
    fn read_key_bytes(&self, len: u32) -> Result<R::Key, InternalError> {
        let host = self.index.host()?;

        let mut raw = PackedBuffer::zeroed(len as usize);
        host.read_key(self.handle()?, 0, &mut raw)?;

        let key = self.index.decode_key(&raw)?;
        self.key.replace(Some(key.clone()));

        Ok(key)
    }

    /// Record the key this cursor was positioned on by its index.
    pub(crate) fn remember_key(&self, key: R::Key) {
        self.key.replace(Some(key));
    }

    /// Decode the record at this cursor.
    pub fn value(&self) -> Result<R, InternalError> {
        let host = self.index.host()?;
        let handle = self.handle()?;

        let (status, len) = host.read_value(handle, 0, &mut [])?;
        match status {
            IteratorStatus::Positioned => {
                let mut raw = PackedBuffer::zeroed(len as usize);
                host.read_value(handle, 0, &mut raw)?;

                unpack_value(&raw, self.index.max_value_bytes()?)
            }
            IteratorStatus::Erased => {
                let key = self
                    .key
                    .borrow()
                    .as_ref()
                    .map_or_else(|| "<erased>".to_string(), |key| format!("{key:?}"));

                Err(InternalError::key_not_found(key))
            }
            IteratorStatus::End => Err(InternalError::invalid_iterator_op(
                "value",
                "cursor is at the end",
            )),
        }
    }

    /// Two cursors are equal when both are at the end, or neither is and
    /// their decoded keys match.
    pub fn try_eq(&self, other: &Self) -> Result<bool, InternalError> {
        match (self.is_end()?, other.is_end()?) {
            (true, true) => Ok(true),
            (false, false) => Ok(self.key()? == other.key()?),
            _ => Ok(false),
        }
    }

    /// Whether both cursors sit on the same store position.
    pub(crate) fn same_position(&self, other: &Self) -> Result<bool, InternalError> {
        let host = self.index.host()?;
        let ord = host.iterator_compare(self.handle()?, other.handle()?)?;

        Ok(ord == Ordering::Equal)
    }

    /// Return the handle to the index, surfacing any store error.
    pub fn release(mut self) -> Result<(), InternalError> {
        match self.handle.take() {
            Some(handle) => self.index.release_handle(handle),
            None => Ok(()),
        }
    }
}

/// Store errors compare as unequal; use [`Cursor::try_eq`] to see them.
impl<H: KvHost, R: Record> PartialEq for Cursor<'_, '_, H, R> {
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other).unwrap_or(false)
    }
}

impl<H: KvHost, R: Record> fmt::Debug for Cursor<'_, '_, H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index.name())
            .field("handle", &self.handle)
            .field("key", &self.key.borrow())
            .finish()
    }
}

impl<H: KvHost, R: Record> Drop for Cursor<'_, '_, H, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.index.release_handle(handle);
        }
    }
}
