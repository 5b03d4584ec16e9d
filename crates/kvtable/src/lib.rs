//! ## Crate layout
//! - `core`: cursors, indexes, tables, the store host seam and observability.
//! - `config`: TOML configuration for tables.
//! - `error`: the stable public error type.
//!
//! The `prelude` module carries the vocabulary needed to declare records and
//! work with tables.

pub use kvtable_config as config;
pub use kvtable_core as core;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::KvConfig,
        core::{
            db::{Cursor, Index, IteratorStatus, KvHost, MemoryHost, Name, Table},
            traits::{KeyCodec, Record},
        },
        error::Error,
    };
    pub use serde::{Deserialize, Serialize};
}
