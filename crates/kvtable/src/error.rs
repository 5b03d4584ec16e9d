use candid::CandidType;
use derive_more::Display;
use kvtable_config::ConfigError;
use kvtable_core::error::{ErrorOrigin as CoreErrorOrigin, InternalError, TableError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(CandidType, Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = err
            .table_error()
            .map_or(ErrorKind::Internal, ErrorKind::from);

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        InternalError::from(err).into()
    }
}

///
/// ErrorKind
/// Public error taxonomy; each variant names the condition that aborted the
/// operation.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A table or index was used before `init`.
    NotInitialized,

    /// Erase, or a single-point range, on an absent key.
    KeyNotFound,

    /// One endpoint of a range scan is absent.
    RangeBoundNotFound,

    /// A cursor was moved past the end or before the first element.
    InvalidIteratorOp,

    /// Stored bytes did not decode into the expected shape.
    Decode,

    /// The store disagreed with itself about a key's position.
    CorruptIndex,

    /// The caller cannot remediate this.
    Internal,
}

impl From<&TableError> for ErrorKind {
    fn from(err: &TableError) -> Self {
        match err {
            TableError::NotInitialized { .. } => Self::NotInitialized,
            TableError::KeyNotFound { .. } => Self::KeyNotFound,
            TableError::RangeBoundNotFound { .. } => Self::RangeBoundNotFound,
            TableError::InvalidIteratorOp { .. } => Self::InvalidIteratorOp,
            TableError::Decode { .. } => Self::Decode,
            TableError::CorruptIndex { .. } => Self::CorruptIndex,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Cursor,
    Host,
    Index,
    Serialize,
    Store,
    Table,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Cursor => Self::Cursor,
            CoreErrorOrigin::Host => Self::Host,
            CoreErrorOrigin::Index => Self::Index,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Table => Self::Table,
        }
    }
}

///
/// TESTS
///
