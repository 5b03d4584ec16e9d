//! Core runtime for kvtable: typed records over an ordered key-value store,
//! with the cursor, index and table layers and the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;
pub mod serialize;
pub mod traits;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, hosts, or serializers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{Cursor, Index, Name, Table},
        traits::{KeyCodec, Record},
    };
}
