//! Capability traits records implement to live in a table.

pub use crate::db::codec::{FixedWidthKey, KeyCodec};
pub use serde::{Deserialize, Serialize, de::DeserializeOwned};

///
/// Record
///
/// A typed value stored in a table. The primary key is derived from the
/// record's own fields; re-deriving it from an unchanged record must always
/// yield the same key.
///

pub trait Record: Serialize + DeserializeOwned {
    type Key: KeyCodec;

    fn primary_key(&self) -> Self::Key;
}
