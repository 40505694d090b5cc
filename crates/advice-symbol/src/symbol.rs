//! OpName - Interned operation identity
//!
//! Provides [`OpName`], the name under which an operation is defined,
//! advised and invoked.

use crate::interner::Interner;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Interned operation name
///
/// Equality, ordering and hashing are by name. Two `OpName`s built from the
/// same text share one allocation in the global [`Interner`].
///
/// # Example
/// ```
/// use advice_symbol::OpName;
///
/// let op = OpName::new("two");
/// assert_eq!(op.as_str(), "two");
/// assert_eq!(op.to_string(), ":two");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpName(Arc<str>);

impl OpName {
    /// Intern a name without validation
    ///
    /// Use [`OpName::parse`] (or `str::parse`) for names coming from callers.
    #[inline]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Interner::global().intern(name))
    }

    /// Validate and intern a name
    ///
    /// # Errors
    /// Returns error if the name is empty, longer than [`OpName::MAX_LEN`],
    /// or contains whitespace or control characters.
    pub fn parse(name: &str) -> Result<Self, SymbolError> {
        if name.is_empty() {
            return Err(SymbolError::Empty);
        }

        if name.len() > Self::MAX_LEN {
            return Err(SymbolError::TooLong {
                len: name.len(),
                max: Self::MAX_LEN,
            });
        }

        if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(SymbolError::InvalidCharacter {
                name: name.to_string(),
                found: c,
            });
        }

        Ok(Self::new(name))
    }

    /// Longest accepted name, in bytes
    pub const MAX_LEN: usize = 255;

    /// Name text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if both names point at the same interned storage
    #[inline]
    #[must_use]
    pub fn shares_storage_with(&self, other: &OpName) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Display for OpName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl fmt::Debug for OpName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "OpName({})", self.0)
    }
}

impl FromStr for OpName {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OpName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OpName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for OpName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OpName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Operation name errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// Empty name
    #[error("operation name is empty")]
    Empty,

    /// Name exceeds length limit
    #[error("operation name is {len} bytes, limit is {max}")]
    TooLong {
        /// Actual length
        len: usize,
        /// Limit
        max: usize,
    },

    /// Whitespace or control character in name
    #[error("operation name {name:?} contains invalid character {found:?}")]
    InvalidCharacter {
        /// Offending name
        name: String,
        /// First invalid character
        found: char,
    },
}
