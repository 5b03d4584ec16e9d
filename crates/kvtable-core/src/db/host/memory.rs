#![allow(clippy::cast_possible_truncation)]
use crate::{
    db::{
        host::{IteratorHandle, IteratorStatus, KvHost},
        identity::Name,
    },
    error::InternalError,
};
use canic_cdk::structures::{
    BTreeMap, DefaultMemoryImpl, Storable,
    memory::{MemoryId, MemoryManager, VirtualMemory},
    storable::Bound,
};
use std::{
    borrow::Cow,
    cell::{Cell, RefCell},
    cmp::Ordering,
    collections::HashMap,
    ops::Bound as RangeEdge,
};

/// Largest raw key the memory host stores (scope excluded).
pub const MAX_HOST_KEY_BYTES: u32 = 2048;

/// Largest value the memory host stores.
pub const MAX_HOST_VALUE_BYTES: u32 = 4 * 1024 * 1024;

// region ++ collection
const SCOPE_BYTES: usize = 2 * Name::STORED_LEN;

///
/// RawEntryKey
/// `region ++ collection ++ key`, ordered byte-lexicographically.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct RawEntryKey(Vec<u8>);

impl Storable for RawEntryKey {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        // Trusted store boundary: bounded by BOUND
        Self(bytes.into_owned())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: SCOPE_BYTES as u32 + MAX_HOST_KEY_BYTES,
        is_fixed_size: false,
    };
}

///
/// RawEntryValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
struct RawEntryValue(Vec<u8>);

impl Storable for RawEntryValue {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        Self(bytes.into_owned())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: MAX_HOST_VALUE_BYTES,
        is_fixed_size: false,
    };
}

///
/// HostIterator
/// One live store-side cursor.
///

struct HostIterator {
    /// `region ++ collection ++ prefix`; every visited key starts with it.
    scope: Vec<u8>,
    /// Full entry key of the current position; `None` is the end sentinel.
    position: Option<RawEntryKey>,
}

impl HostIterator {
    fn user_key(&self) -> Option<&[u8]> {
        self.position.as_ref().map(|key| &key.0[SCOPE_BYTES..])
    }
}

///
/// MemoryHost
///
/// In-process `KvHost` over a stable-memory BTreeMap. Cursor status is
/// computed live, so erasing the pair under a cursor turns it `Erased`.
///

pub struct MemoryHost {
    map: RefCell<BTreeMap<RawEntryKey, RawEntryValue, VirtualMemory<DefaultMemoryImpl>>>,
    iterators: RefCell<HashMap<IteratorHandle, HostIterator>>,
    next_handle: Cell<u32>,
}

impl MemoryHost {
    #[must_use]
    /// Initialize a host with the provided backing memory.
    pub fn init(memory: VirtualMemory<DefaultMemoryImpl>) -> Self {
        Self {
            map: RefCell::new(BTreeMap::init(memory)),
            iterators: RefCell::new(HashMap::new()),
            next_handle: Cell::new(0),
        }
    }

    /// Host over a fresh, private memory region.
    #[must_use]
    pub fn new() -> Self {
        let manager = MemoryManager::init(DefaultMemoryImpl::default());

        Self::init(manager.get(MemoryId::new(0)))
    }

    /// Number of stored pairs across all regions and collections.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.map.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of iterator handles created and not yet destroyed.
    #[must_use]
    pub fn live_iterators(&self) -> usize {
        self.iterators.borrow().len()
    }

    fn scoped(region: Name, collection: Name, key: &[u8]) -> RawEntryKey {
        let mut out = Vec::with_capacity(SCOPE_BYTES + key.len());
        out.extend_from_slice(&region.to_bytes());
        out.extend_from_slice(&collection.to_bytes());
        out.extend_from_slice(key);

        RawEntryKey(out)
    }

    fn check_key(key: &[u8]) -> Result<(), InternalError> {
        if key.len() > MAX_HOST_KEY_BYTES as usize {
            return Err(InternalError::store_unsupported(format!(
                "key exceeds max size: {} bytes (limit {MAX_HOST_KEY_BYTES})",
                key.len()
            )));
        }

        Ok(())
    }

    // First key in `range` that still belongs to `scope`.
    fn first_in(
        &self,
        scope: &[u8],
        range: (RangeEdge<RawEntryKey>, RangeEdge<RawEntryKey>),
    ) -> Option<RawEntryKey> {
        let map = self.map.borrow();
        let first = map.range(range).next().map(|entry| entry.key().clone());

        first.filter(|key| key.0.starts_with(scope))
    }

    // Last key in `range` that still belongs to `scope`.
    fn last_in(
        &self,
        scope: &[u8],
        range: (RangeEdge<RawEntryKey>, RangeEdge<RawEntryKey>),
    ) -> Option<RawEntryKey> {
        let map = self.map.borrow();
        let last = map.range(range).next_back().map(|entry| entry.key().clone());

        last.filter(|key| key.0.starts_with(scope))
    }

    // Smallest key strictly greater than every key starting with `scope`.
    fn scope_end(scope: &[u8]) -> RangeEdge<RawEntryKey> {
        let mut end = scope.to_vec();
        while let Some(last) = end.pop() {
            if last < u8::MAX {
                end.push(last + 1);
                return RangeEdge::Excluded(RawEntryKey(end));
            }
        }

        RangeEdge::Unbounded
    }

    fn status_of(&self, position: Option<&RawEntryKey>) -> IteratorStatus {
        match position {
            None => IteratorStatus::End,
            Some(key) if self.map.borrow().contains_key(key) => IteratorStatus::Positioned,
            Some(_) => IteratorStatus::Erased,
        }
    }

    fn with_iterator<T>(
        &self,
        it: IteratorHandle,
        f: impl FnOnce(&HostIterator) -> T,
    ) -> Result<T, InternalError> {
        let iterators = self.iterators.borrow();
        let iter = iterators
            .get(&it)
            .ok_or_else(|| InternalError::host_invariant(format!("unknown iterator {it}")))?;

        Ok(f(iter))
    }

    // Move `it` to `position` and report the resulting status.
    fn reposition(
        &self,
        it: IteratorHandle,
        position: Option<RawEntryKey>,
    ) -> Result<IteratorStatus, InternalError> {
        let status = self.status_of(position.as_ref());
        let mut iterators = self.iterators.borrow_mut();
        let iter = iterators
            .get_mut(&it)
            .ok_or_else(|| InternalError::host_invariant(format!("unknown iterator {it}")))?;
        iter.position = position;

        Ok(status)
    }

    fn scope_of(
        &self,
        it: IteratorHandle,
    ) -> Result<(Vec<u8>, Option<RawEntryKey>), InternalError> {
        self.with_iterator(it, |iter| (iter.scope.clone(), iter.position.clone()))
    }

    // Copy `source[offset..]` into `dest`, returning the full source length.
    fn copy_out(source: &[u8], offset: u32, dest: &mut [u8]) -> u32 {
        let start = (offset as usize).min(source.len());
        let tail = &source[start..];
        let n = tail.len().min(dest.len());
        dest[..n].copy_from_slice(&tail[..n]);

        source.len() as u32
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl KvHost for MemoryHost {
    fn set(
        &self,
        region: Name,
        collection: Name,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), InternalError> {
        Self::check_key(key)?;
        if value.len() > MAX_HOST_VALUE_BYTES as usize {
            return Err(InternalError::store_unsupported(format!(
                "value exceeds max size: {} bytes (limit {MAX_HOST_VALUE_BYTES})",
                value.len()
            )));
        }

        self.map.borrow_mut().insert(
            Self::scoped(region, collection, key),
            RawEntryValue(value.to_vec()),
        );

        Ok(())
    }

    fn erase(&self, region: Name, collection: Name, key: &[u8]) -> Result<(), InternalError> {
        let _ = self
            .map
            .borrow_mut()
            .remove(&Self::scoped(region, collection, key));

        Ok(())
    }

    fn get(
        &self,
        region: Name,
        collection: Name,
        key: &[u8],
    ) -> Result<Option<u32>, InternalError> {
        let value = self.map.borrow().get(&Self::scoped(region, collection, key));

        Ok(value.map(|value| value.0.len() as u32))
    }

    fn iterator_create(
        &self,
        region: Name,
        collection: Name,
        prefix: &[u8],
    ) -> Result<IteratorHandle, InternalError> {
        Self::check_key(prefix)?;

        let raw = self.next_handle.get();
        let next = raw
            .checked_add(1)
            .ok_or_else(|| InternalError::host_invariant("iterator handles exhausted"))?;
        self.next_handle.set(next);

        let it = IteratorHandle::new(raw);
        self.iterators.borrow_mut().insert(
            it,
            HostIterator {
                scope: Self::scoped(region, collection, prefix).0,
                position: None,
            },
        );

        Ok(it)
    }

    fn iterator_destroy(&self, it: IteratorHandle) -> Result<(), InternalError> {
        self.iterators
            .borrow_mut()
            .remove(&it)
            .map(|_| ())
            .ok_or_else(|| InternalError::host_invariant(format!("unknown iterator {it}")))
    }

    fn iterator_status(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError> {
        let (_, position) = self.scope_of(it)?;

        Ok(self.status_of(position.as_ref()))
    }

    fn iterator_move_to_end(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError> {
        self.reposition(it, None)
    }

    fn iterator_lower_bound(
        &self,
        it: IteratorHandle,
        key: &[u8],
    ) -> Result<IteratorStatus, InternalError> {
        let (scope, _) = self.scope_of(it)?;

        let mut start = scope[..SCOPE_BYTES].to_vec();
        start.extend_from_slice(key);
        let start = RawEntryKey(start.max(scope.clone()));

        let found = self.first_in(&scope, (RangeEdge::Included(start), RangeEdge::Unbounded));
        self.reposition(it, found)
    }

    fn iterator_next(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError> {
        let (scope, position) = self.scope_of(it)?;

        let range = match position {
            Some(current) => (RangeEdge::Excluded(current), RangeEdge::Unbounded),
            None => (
                RangeEdge::Included(RawEntryKey(scope.clone())),
                RangeEdge::Unbounded,
            ),
        };

        let found = self.first_in(&scope, range);
        self.reposition(it, found)
    }

    fn iterator_prev(&self, it: IteratorHandle) -> Result<IteratorStatus, InternalError> {
        let (scope, position) = self.scope_of(it)?;

        let range = match position {
            Some(current) => (
                RangeEdge::Included(RawEntryKey(scope.clone())),
                RangeEdge::Excluded(current),
            ),
            None => (
                RangeEdge::Included(RawEntryKey(scope.clone())),
                Self::scope_end(&scope),
            ),
        };

        let found = self.last_in(&scope, range);
        self.reposition(it, found)
    }

    fn iterator_key_compare(
        &self,
        it: IteratorHandle,
        key: &[u8],
    ) -> Result<Ordering, InternalError> {
        self.with_iterator(it, |iter| {
            iter.user_key()
                .map_or(Ordering::Greater, |current| current.cmp(key))
        })
    }

    fn iterator_compare(
        &self,
        a: IteratorHandle,
        b: IteratorHandle,
    ) -> Result<Ordering, InternalError> {
        let (scope_a, pos_a) = self.scope_of(a)?;
        let (scope_b, pos_b) = self.scope_of(b)?;
        if scope_a != scope_b {
            return Err(InternalError::host_invariant(format!(
                "cannot compare iterators {a} and {b} over different scopes"
            )));
        }

        Ok(match (pos_a, pos_b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => left.cmp(&right),
        })
    }

    fn read_key(
        &self,
        it: IteratorHandle,
        offset: u32,
        dest: &mut [u8],
    ) -> Result<(IteratorStatus, u32), InternalError> {
        let (_, position) = self.scope_of(it)?;
        let status = self.status_of(position.as_ref());

        // an erased position still reports the key it sat on
        match position {
            Some(key) => {
                let len = Self::copy_out(&key.0[SCOPE_BYTES..], offset, dest);
                Ok((status, len))
            }
            None => Ok((status, 0)),
        }
    }

    fn read_value(
        &self,
        it: IteratorHandle,
        offset: u32,
        dest: &mut [u8],
    ) -> Result<(IteratorStatus, u32), InternalError> {
        let (_, position) = self.scope_of(it)?;
        let Some(key) = position else {
            return Ok((IteratorStatus::End, 0));
        };

        match self.map.borrow().get(&key) {
            Some(value) => {
                let len = Self::copy_out(&value.0, offset, dest);
                Ok((IteratorStatus::Positioned, len))
            }
            None => Ok((IteratorStatus::Erased, 0)),
        }
    }
}
