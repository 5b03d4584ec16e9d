//! Module: index
//! Responsibility: map typed keys onto store lookups and ordered scans, and
//! hand out cursors over one index key space.
//! Does not own: record encoding policy or write-side size limits (see
//! `db::table`).
//!
//! Store key layout: `table ++ index ++ packed key`, where both names use
//! their fixed stored form. Every cursor is created with `table ++ index` as
//! its prefix, so traversal never leaves the index.


use crate::{
    db::{
        buffer::PackedBuffer,
        codec::KeyCodec,
        cursor::Cursor,
        host::{IteratorHandle, IteratorStatus, KvHost},
        identity::{Name, TablePath},
    },
    error::{InternalError, RangeBound},
    obs::sink::{self, MetricsEvent},
    traits::Record,
};
use std::{cell::RefCell, cmp::Ordering};

/// Bytes in front of every packed key: table name then index name.
pub const INDEX_PREFIX_BYTES: usize = 2 * Name::STORED_LEN;

///
/// IndexBinding
/// Everything an index learns when its table is initialized.
///

pub(crate) struct IndexBinding<'h, H> {
    pub(crate) host: &'h H,
    pub(crate) region: Name,
    pub(crate) path: TablePath,
    pub(crate) cursor_pool_size: usize,
    pub(crate) max_value_bytes: usize,
    pub(crate) debug: bool,
}

///
/// Index
///
/// One named key space of a table with its key-derivation function.
/// Unusable until bound by `Table::init`.
///

pub struct Index<'h, H: KvHost, R: Record> {
    name: Name,
    key_fn: fn(&R) -> R::Key,
    binding: Option<IndexBinding<'h, H>>,
    prefix: [u8; INDEX_PREFIX_BYTES],
    pool: RefCell<Vec<IteratorHandle>>,
}

impl<'h, H: KvHost, R: Record> Index<'h, H, R> {
    #[must_use]
    pub const fn new(name: Name, key_fn: fn(&R) -> R::Key) -> Self {
        Self {
            name,
            key_fn,
            binding: None,
            prefix: [0; INDEX_PREFIX_BYTES],
            pool: RefCell::new(Vec::new()),
        }
    }

    /// Index keyed by the record's primary key.
    #[must_use]
    pub fn primary(name: Name) -> Self {
        Self::new(name, R::primary_key)
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.name
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Derive this index's key for one record.
    pub fn key_of(&self, record: &R) -> R::Key {
        (self.key_fn)(record)
    }

    // ─────────────────────────────────────────────
    // Binding
    // ─────────────────────────────────────────────

    pub(crate) fn bind(&mut self, binding: IndexBinding<'h, H>) -> Result<(), InternalError> {
        if self.binding.is_some() {
            return Err(InternalError::table_invariant(format!(
                "index '{}' is already bound",
                self.name
            )));
        }

        let (table, index) = self.prefix.split_at_mut(Name::STORED_LEN);
        table.copy_from_slice(&binding.path.table.to_bytes());
        index.copy_from_slice(&self.name.to_bytes());
        self.binding = Some(binding);

        Ok(())
    }

    fn binding(&self) -> Result<&IndexBinding<'h, H>, InternalError> {
        self.binding
            .as_ref()
            .ok_or_else(|| InternalError::not_initialized(format!("index '{}'", self.name)))
    }

    pub(crate) fn host(&self) -> Result<&'h H, InternalError> {
        Ok(self.binding()?.host)
    }

    pub(crate) fn max_value_bytes(&self) -> Result<usize, InternalError> {
        Ok(self.binding()?.max_value_bytes)
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.binding.as_ref().is_some_and(|b| b.debug) {
            println!("[debug] {}", s.into());
        }
    }

    // ─────────────────────────────────────────────
    // Key bytes
    // ─────────────────────────────────────────────

    /// Store key for `key`: index prefix then packed key.
    pub(crate) fn pack_key(&self, key: &R::Key) -> Result<PackedBuffer, InternalError> {
        self.binding()?;

        let mut out = PackedBuffer::acquire(INDEX_PREFIX_BYTES + key.packed_size());
        out.extend_from_slice(&self.prefix);
        key.pack_into(&mut out);

        Ok(out)
    }

    /// Decode a typed key from a raw store key of this index.
    pub(crate) fn decode_key(&self, raw: &[u8]) -> Result<R::Key, InternalError> {
        let packed = raw.strip_prefix(self.prefix.as_slice()).ok_or_else(|| {
            InternalError::corrupt_index(format!(
                "store key outside index '{}' ({} bytes)",
                self.name,
                raw.len()
            ))
        })?;

        Ok(R::Key::unpack(packed)?)
    }

    // ─────────────────────────────────────────────
    // Handle pool
    // ─────────────────────────────────────────────

    // Fresh cursor; its position is unspecified until the caller moves it.
    fn acquire(&self) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        let b = self.binding()?;

        let pooled = self.pool.borrow_mut().pop();
        let handle = if let Some(handle) = pooled {
            sink::record(MetricsEvent::CursorOpen { reused: true });
            handle
        } else {
            let handle = b.host.iterator_create(b.region, b.path.owner, &self.prefix)?;
            sink::record(MetricsEvent::CursorOpen { reused: false });
            handle
        };

        Ok(Cursor::new(self, handle))
    }

    /// Take back a handle from a finished cursor; keep it for reuse or
    /// destroy it once the pool is full.
    pub(crate) fn release_handle(&self, handle: IteratorHandle) -> Result<(), InternalError> {
        let b = self.binding()?;

        {
            let mut pool = self.pool.borrow_mut();
            if pool.len() < b.cursor_pool_size {
                pool.push(handle);
                return Ok(());
            }
        }

        sink::record(MetricsEvent::CursorClose);
        b.host.iterator_destroy(handle)
    }

    /// Number of idle handles kept for reuse.
    #[must_use]
    pub fn pooled_handles(&self) -> usize {
        self.pool.borrow().len()
    }

    // ─────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────

    /// Whether `key` is present.
    pub fn contains(&self, key: &R::Key) -> Result<bool, InternalError> {
        let b = self.binding()?;
        let raw = self.pack_key(key)?;

        Ok(b.host.get(b.region, b.path.owner, &raw)?.is_some())
    }

    /// Cursor at `key`, or the end cursor if it is absent.
    pub fn find(&self, key: &R::Key) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        let b = self.binding()?;
        let raw = self.pack_key(key)?;

        let hit = b.host.get(b.region, b.path.owner, &raw)?.is_some();
        sink::record(MetricsEvent::Find { path: b.path, hit });

        if !hit {
            self.debug_log(format!("find {}: {key:?} absent", b.path));
            return self.end();
        }

        let cursor = self.acquire()?;
        let handle = cursor.handle()?;
        let status = b.host.iterator_lower_bound(handle, &raw)?;

        if status != IteratorStatus::Positioned
            || b.host.iterator_key_compare(handle, &raw)? != Ordering::Equal
        {
            return Err(InternalError::corrupt_index(format!(
                "lower bound for {key:?} in index '{}' of {} did not land on the key",
                self.name, b.path
            )));
        }
        cursor.remember_key(key.clone());

        Ok(cursor)
    }

    /// Cursor at the first key, or the end cursor if the index is empty.
    pub fn begin(&self) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        let b = self.binding()?;
        let cursor = self.acquire()?;
        b.host.iterator_lower_bound(cursor.handle()?, &self.prefix)?;

        Ok(cursor)
    }

    /// The out-of-bounds sentinel cursor.
    pub fn end(&self) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        let b = self.binding()?;
        let cursor = self.acquire()?;
        b.host.iterator_move_to_end(cursor.handle()?)?;

        Ok(cursor)
    }

    /// Cursor at the first key `>= key`.
    pub fn lower_bound(&self, key: &R::Key) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        let b = self.binding()?;
        let raw = self.pack_key(key)?;
        let cursor = self.acquire()?;
        b.host.iterator_lower_bound(cursor.handle()?, &raw)?;

        Ok(cursor)
    }

    /// Cursor at the first key `> key`.
    pub fn upper_bound(&self, key: &R::Key) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        let b = self.binding()?;
        let raw = self.pack_key(key)?;
        let cursor = self.acquire()?;
        let handle = cursor.handle()?;

        let status = b.host.iterator_lower_bound(handle, &raw)?;
        if status == IteratorStatus::Positioned
            && b.host.iterator_key_compare(handle, &raw)? == Ordering::Equal
        {
            b.host.iterator_next(handle)?;
        }

        Ok(cursor)
    }

    // ─────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────

    /// Remove the pair at `key`. Fails if it is absent.
    pub fn erase(&self, key: &R::Key) -> Result<(), InternalError> {
        let b = self.binding()?;

        let cursor = self.find(key)?;
        if cursor.is_end()? {
            return Err(InternalError::key_not_found(format!("{key:?}")));
        }
        cursor.release()?;

        let raw = self.pack_key(key)?;
        b.host.erase(b.region, b.path.owner, &raw)?;
        self.debug_log(format!("erase {}: {key:?}", b.path));

        Ok(())
    }

    // ─────────────────────────────────────────────
    // Scans
    // ─────────────────────────────────────────────

    /// Records from `low` through `high`, both inclusive, in ascending key
    /// order. Both bounds must be present; `low > high` yields no rows.
    pub fn range(&self, low: &R::Key, high: &R::Key) -> Result<Vec<R>, InternalError> {
        let b = self.binding()?;

        let rows = if low == high {
            let cursor = self.find(low)?;
            if cursor.is_end()? {
                return Err(InternalError::key_not_found(format!("{low:?}")));
            }

            vec![cursor.value()?]
        } else {
            let mut cursor = self.find(low)?;
            if cursor.is_end()? {
                return Err(InternalError::range_bound_not_found(
                    RangeBound::Low,
                    format!("{low:?}"),
                ));
            }
            let last = self.find(high)?;
            if last.is_end()? {
                return Err(InternalError::range_bound_not_found(
                    RangeBound::High,
                    format!("{high:?}"),
                ));
            }

            if low > high {
                Vec::new()
            } else {
                let mut rows = Vec::new();
                loop {
                    rows.push(cursor.value()?);
                    if cursor.same_position(&last)? {
                        break;
                    }
                    if cursor.next()?.is_end() {
                        return Err(InternalError::corrupt_index(format!(
                            "range {low:?}..={high:?} of {} ran past its upper bound",
                            b.path
                        )));
                    }
                }

                rows
            }
        };

        sink::record(MetricsEvent::Range {
            path: b.path,
            rows_scanned: rows.len() as u64,
        });
        self.debug_log(format!(
            "range {}: {low:?}..={high:?} -> {} rows",
            b.path,
            rows.len()
        ));

        Ok(rows)
    }

    /// Lazy ascending scan over every record in the index.
    pub fn iter(&self) -> Result<Iter<'_, 'h, H, R>, InternalError> {
        Ok(Iter {
            cursor: Some(self.begin()?),
        })
    }
}

impl<H: KvHost, R: Record> Drop for Index<'_, H, R> {
    fn drop(&mut self) {
        let Some(b) = self.binding.as_ref() else {
            return;
        };

        for handle in self.pool.get_mut().drain(..) {
            sink::record(MetricsEvent::CursorClose);
            let _ = b.host.iterator_destroy(handle);
        }
    }
}

///
/// Iter
///
/// Yields each record once, in key order. Pairs erased while the scan is
/// under way are skipped. Stops after the first error.
///

pub struct Iter<'i, 'h, H: KvHost, R: Record> {
    cursor: Option<Cursor<'i, 'h, H, R>>,
}

impl<H: KvHost, R: Record> Iterator for Iter<'_, '_, H, R> {
    type Item = Result<R, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;

        // pairs erased under the cursor are stepped over
        let item = loop {
            match cursor.status() {
                Ok(IteratorStatus::End) => {
                    self.cursor = None;
                    return None;
                }
                Ok(IteratorStatus::Erased) => {
                    if let Err(err) = cursor.next() {
                        break Err(err);
                    }
                }
                Ok(IteratorStatus::Positioned) => {
                    break cursor
                        .value()
                        .and_then(|value| cursor.next().map(|_| value));
                }
                Err(err) => break Err(err),
            }
        };

        if item.is_err() {
            self.cursor = None;
        }

        Some(item)
    }
}
