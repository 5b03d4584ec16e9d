//! Shared fixtures for unit tests.

use crate::{
    db::{Index, MemoryHost, Name, Table, codec::value_packed_size},
    traits::Record,
};
use serde::{Deserialize, Serialize};

///
/// Blob
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub(crate) struct Blob {
    pub(crate) id: u64,
    pub(crate) body: String,
}

impl Blob {
    pub(crate) fn new(id: u64, body: &str) -> Self {
        Self {
            id,
            body: body.to_string(),
        }
    }
}

impl Record for Blob {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.id
    }
}

/// Build a blob whose packed value is exactly `target` bytes.
pub(crate) fn blob_with_packed_size(id: u64, target: usize) -> Blob {
    let mut blob = Blob::new(id, "");
    loop {
        let size = value_packed_size(&blob).expect("blob should encode");
        if size == target {
            return blob;
        }
        assert!(size < target, "cannot hit packed size {target} for id {id}");
        blob.body.push('x');
    }
}

pub(crate) fn name(s: &str) -> Name {
    Name::try_from_str(s).expect("test name should be valid")
}

pub(crate) fn memory_host() -> MemoryHost {
    MemoryHost::new()
}

/// Initialized `alice.blobs` table holding one blob per id.
pub(crate) fn seeded_table<'h>(host: &'h MemoryHost, ids: &[u64]) -> Table<'h, MemoryHost, Blob> {
    let mut table = Table::new(host);
    table
        .init(name("alice"), name("blobs"), Index::primary(name("primary")))
        .expect("table should init");
    for id in ids {
        table
            .upsert(&Blob::new(*id, &format!("blob {id}")))
            .expect("upsert should succeed");
    }

    table
}
