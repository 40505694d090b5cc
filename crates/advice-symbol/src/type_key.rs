//! Stable type identifiers

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Identifier of a type in the host hierarchy
///
/// Keys are handed out by the host in declaration order and never reused,
/// so a key stays valid for the lifetime of the host that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(u32);

impl TypeKey {
    /// Create key from raw index
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Raw index as a slice position
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}
