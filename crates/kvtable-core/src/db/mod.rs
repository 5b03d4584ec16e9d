//! Storage-facing runtime: identifiers, codecs, the host seam, and the
//! cursor/index/table layers built on it.

pub mod buffer;
pub mod codec;
pub mod cursor;
pub mod host;
pub mod identity;
pub mod index;
pub mod table;

// re-exports
pub use cursor::Cursor;
pub use host::{IteratorHandle, IteratorStatus, KvHost, MemoryHost};
pub use identity::{Name, TablePath};
pub use index::{Index, Iter};
pub use table::Table;
