//! Module: identity
//! Responsibility: store identifiers (regions, collections, tables, indexes).
//!
//! A `Name` is kept in its stored form: one length byte, then up to
//! `MAX_NAME_LEN` ASCII bytes, zero padded. Comparing names therefore
//! compares their stored bytes.

#[cfg(test)]
mod tests;

use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

pub const MAX_NAME_LEN: usize = 12;

const STORED_LEN: usize = 1 + MAX_NAME_LEN;

///
/// NameError
///

#[derive(Debug, ThisError)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    #[error("name '{0}' is longer than {max} bytes", max = MAX_NAME_LEN)]
    TooLong(String),

    #[error("name is not ASCII")]
    NonAscii,

    #[error("stored name is {0} bytes, expected {expected}", expected = STORED_LEN)]
    StoredSize(usize),

    #[error("stored name has length byte {0}")]
    StoredLength(u8),

    #[error("stored name has non-zero padding")]
    StoredPadding,
}

///
/// Name
///

#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Name([u8; STORED_LEN]);

impl Name {
    /// Bytes in the stored form.
    pub const STORED_LEN: usize = STORED_LEN;

    pub fn try_from_str(name: &str) -> Result<Self, NameError> {
        let Ok(len) = u8::try_from(name.len()) else {
            return Err(NameError::TooLong(name.to_string()));
        };

        match name.len() {
            0 => Err(NameError::Empty),
            n if n > MAX_NAME_LEN => Err(NameError::TooLong(name.to_string())),
            _ if !name.is_ascii() => Err(NameError::NonAscii),
            n => {
                let mut stored = [0u8; Self::STORED_LEN];
                stored[0] = len;
                stored[1..=n].copy_from_slice(name.as_bytes());

                Ok(Self(stored))
            }
        }
    }

    /// Validate a stored name read back from the store.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NameError> {
        let stored: [u8; Self::STORED_LEN] = bytes
            .try_into()
            .map_err(|_| NameError::StoredSize(bytes.len()))?;

        let len = usize::from(stored[0]);
        if len == 0 || len > MAX_NAME_LEN {
            return Err(NameError::StoredLength(stored[0]));
        }
        if !stored[1..=len].is_ascii() {
            return Err(NameError::NonAscii);
        }
        if stored[len + 1..].iter().any(|&b| b != 0) {
            return Err(NameError::StoredPadding);
        }

        Ok(Self(stored))
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::STORED_LEN] {
        self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[1..=usize::from(self.0[0])]
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_str(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ASCII, so one char per byte
        self.as_bytes()
            .iter()
            .try_for_each(|&b| fmt::Write::write_char(f, char::from(b)))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

///
/// TablePath
/// Owning collection plus table name; the label tables report under.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TablePath {
    pub owner: Name,
    pub table: Name,
}

impl TablePath {
    #[must_use]
    pub const fn new(owner: Name, table: Name) -> Self {
        Self { owner, table }
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.table)
    }
}
