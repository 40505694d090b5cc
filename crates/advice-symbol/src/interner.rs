//! Process-wide name interner
//!
//! Provides [`Interner`], the table that hands out shared storage for
//! operation names.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL: Lazy<Interner> = Lazy::new(Interner::new);

/// Concurrent string interner
///
/// Every distinct name is stored once; interning the same text again returns
/// a clone of the stored `Arc<str>`. Entries are never evicted.
#[derive(Debug, Default)]
pub struct Interner {
    names: DashMap<Arc<str>, ()>,
}

impl Interner {
    /// Create empty interner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: DashMap::new(),
        }
    }

    /// The interner used by [`crate::OpName`]
    #[inline]
    #[must_use]
    pub fn global() -> &'static Interner {
        &GLOBAL
    }

    /// Intern `name`, returning its shared storage
    #[must_use]
    pub fn intern(&self, name: &str) -> Arc<str> {
        if let Some(entry) = self.names.get(name) {
            return Arc::clone(entry.key());
        }

        // Another thread may win the race; entry() keeps whichever landed first.
        let candidate: Arc<str> = Arc::from(name);
        let entry = self.names.entry(candidate).or_insert(());
        Arc::clone(entry.key())
    }

    /// Check whether `name` has been interned
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of distinct names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if interner is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
