use kvtable_config::ConfigError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    // Construct an error that carries one table-layer detail.
    fn with_table_detail(class: ErrorClass, origin: ErrorOrigin, detail: TableError) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(ErrorDetail::Table(detail)),
        }
    }

    /// Construct a store-origin unsupported error.
    pub(crate) fn store_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Store, message.into())
    }

    /// Construct a host-origin invariant violation (bad handle, bad call order).
    pub(crate) fn host_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Host,
            message.into(),
        )
    }

    /// Construct a table-origin invariant violation.
    pub(crate) fn table_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Table,
            message.into(),
        )
    }

    /// Construct a serialize-origin internal error.
    pub(crate) fn serialize_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Serialize, message.into())
    }

    /// A table or index was used before `init` bound it.
    pub fn not_initialized(what: impl Into<String>) -> Self {
        Self::with_table_detail(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Table,
            TableError::NotInitialized { what: what.into() },
        )
    }

    /// The key is absent from the index it was looked up in.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::with_table_detail(
            ErrorClass::NotFound,
            ErrorOrigin::Index,
            TableError::KeyNotFound { key: key.into() },
        )
    }

    /// One endpoint of a range scan is absent.
    pub fn range_bound_not_found(bound: RangeBound, key: impl Into<String>) -> Self {
        Self::with_table_detail(
            ErrorClass::NotFound,
            ErrorOrigin::Index,
            TableError::RangeBoundNotFound {
                bound,
                key: key.into(),
            },
        )
    }

    /// A cursor was navigated or read in a state that does not allow it.
    pub fn invalid_iterator_op(op: &'static str, reason: impl Into<String>) -> Self {
        Self::with_table_detail(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Cursor,
            TableError::InvalidIteratorOp {
                op,
                reason: reason.into(),
            },
        )
    }

    /// Stored bytes did not decode into the expected key or value shape.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::with_table_detail(
            ErrorClass::Corruption,
            ErrorOrigin::Serialize,
            TableError::Decode {
                message: message.into(),
            },
        )
    }

    /// Lower-bound positioning disagreed with an exact lookup.
    pub fn corrupt_index(message: impl Into<String>) -> Self {
        Self::with_table_detail(
            ErrorClass::Corruption,
            ErrorOrigin::Index,
            TableError::CorruptIndex {
                message: message.into(),
            },
        )
    }

    /// Borrow the table-layer detail, if this error carries one.
    #[must_use]
    pub const fn table_error(&self) -> Option<&TableError> {
        match &self.detail {
            Some(ErrorDetail::Table(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::Table(TableError::KeyNotFound { .. }))
        )
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Table, err.to_string())
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Table(TableError),
}

///
/// TableError
///
/// The failure conditions callers of tables, indexes and cursors can observe.
/// Every one of them aborts the operation it occurs in.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TableError {
    #[error("{what} used before init")]
    NotInitialized { what: String },

    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("{bound} of range is not in table: {key}")]
    RangeBoundNotFound { bound: RangeBound, key: String },

    #[error("invalid iterator operation '{op}': {reason}")]
    InvalidIteratorOp { op: &'static str, reason: String },

    #[error("decode failed: {message}")]
    Decode { message: String },

    #[error("corrupt index: {message}")]
    CorruptIndex { message: String },
}

///
/// RangeBound
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeBound {
    Low,
    High,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "beginning",
            Self::High => "end",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Serialize,
    Store,
    Host,
    Cursor,
    Index,
    Table,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Serialize => "serialize",
            Self::Store => "store",
            Self::Host => "host",
            Self::Cursor => "cursor",
            Self::Index => "index",
            Self::Table => "table",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_carry_no_detail() {
        let err = InternalError::new(ErrorClass::Corruption, ErrorOrigin::Store, "bad page");

        assert!(err.detail.is_none());
        assert!(err.table_error().is_none());
        assert_eq!(err.display_with_class(), "store:corruption: bad page");
    }

    #[test]
    fn table_details_drive_the_message() {
        let err = InternalError::range_bound_not_found(RangeBound::High, "99");

        assert_eq!(err.message, "end of range is not in table: 99");
        assert_eq!(err.class, ErrorClass::NotFound);
        assert_eq!(err.origin, ErrorOrigin::Index);
        assert!(matches!(
            err.table_error(),
            Some(TableError::RangeBoundNotFound {
                bound: RangeBound::High,
                ..
            })
        ));
    }

    #[test]
    fn display_with_class_prefixes_origin_and_class() {
        let err = InternalError::not_initialized("table");

        assert_eq!(
            err.display_with_class(),
            "table:invariant_violation: table used before init"
        );
    }

    #[test]
    fn only_key_not_found_counts_as_not_found() {
        assert!(InternalError::key_not_found("7").is_not_found());
        assert!(!InternalError::range_bound_not_found(RangeBound::Low, "7").is_not_found());
    }
}
