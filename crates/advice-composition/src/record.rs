//! Composition records
//!
//! Provides [`CompositionRecord`], the {before, original, after} triple the
//! rebuild engine turns into an effective operation.
//!
//! One record serves every type that resolves to its owner. Originals are
//! kept per defining type, so an override in one subtype never leaks into
//! the owner or a sibling.

use crate::chain::AdviceChain;
use crate::interceptor::Advice;
use crate::method::Method;
use crate::state::AdviceState;
use advice_symbol::{OpName, TypeKey};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        Self(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record#{}", self.0)
    }
}

/// Advice and original implementation of one operation
#[derive(Debug, Clone)]
pub struct CompositionRecord {
    id: RecordId,
    op: OpName,
    before: AdviceChain,
    originals: IndexMap<TypeKey, Method>,
    after: AdviceChain,
    installed: IndexSet<TypeKey>,
}

impl CompositionRecord {
    /// Create record with empty chains wrapping `definer`'s implementation
    #[must_use]
    pub fn new(op: OpName, definer: TypeKey, original: Method) -> Self {
        let mut originals = IndexMap::new();
        originals.insert(definer, original);
        Self {
            id: RecordId::next(),
            op,
            before: AdviceChain::new(),
            originals,
            after: AdviceChain::new(),
            installed: IndexSet::new(),
        }
    }

    /// Record identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Operation this record composes
    #[inline]
    #[must_use]
    pub fn op(&self) -> &OpName {
        &self.op
    }

    /// Before-chain, in run order
    #[inline]
    #[must_use]
    pub fn before(&self) -> &AdviceChain {
        &self.before
    }

    /// After-chain, in run order
    #[inline]
    #[must_use]
    pub fn after(&self) -> &AdviceChain {
        &self.after
    }

    /// Captured implementations by defining type, oldest first
    pub fn originals(&self) -> impl Iterator<Item = (TypeKey, &Method)> {
        self.originals.iter().map(|(ty, method)| (*ty, method))
    }

    /// Implementation wrapped for a type with the given ancestor chain
    ///
    /// `ancestors` lists the type and its ancestors, most-derived first; the
    /// nearest captured definition wins.
    #[must_use]
    pub fn original_for(&self, ancestors: &[TypeKey]) -> Option<&Method> {
        ancestors.iter().find_map(|ty| self.originals.get(ty))
    }

    /// Record `definer`'s implementation; chains are kept
    #[inline]
    pub fn set_original(&mut self, definer: TypeKey, original: Method) {
        self.originals.insert(definer, original);
    }

    /// Types carrying an effective operation built from this record
    pub fn installed(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.installed.iter().copied()
    }

    /// Note that `ty` carries an effective operation built from this record
    #[inline]
    pub fn mark_installed(&mut self, ty: TypeKey) {
        self.installed.insert(ty);
    }

    /// Stop rebuilding `ty` from this record
    #[inline]
    pub fn forget_installed(&mut self, ty: TypeKey) {
        self.installed.shift_remove(&ty);
    }

    /// Add before-advice; it runs ahead of all existing before-advice
    #[inline]
    pub fn add_before(&mut self, advice: Advice) {
        self.before.prepend(advice);
    }

    /// Add after-advice; it runs after all existing after-advice
    #[inline]
    pub fn add_after(&mut self, advice: Advice) {
        self.after.append(advice);
    }

    /// Clear both chains
    pub fn clear(&mut self) {
        self.before.clear();
        self.after.clear();
    }

    /// Check if any advice is attached
    #[inline]
    #[must_use]
    pub fn is_advised(&self) -> bool {
        !(self.before.is_empty() && self.after.is_empty())
    }

    /// Current advice state
    #[inline]
    #[must_use]
    pub fn state(&self) -> AdviceState {
        if self.is_advised() {
            AdviceState::Advised
        } else {
            AdviceState::Unadvised
        }
    }

    /// Read-only summary, attributed to `owner`
    #[must_use]
    pub fn snapshot(&self, owner: TypeKey, owner_name: &str) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id,
            op: self.op.clone(),
            owner,
            owner_name: owner_name.to_string(),
            before: self.before.labels(),
            after: self.after.labels(),
            original_arity: self.originals.values().next().map_or(0, Method::arity),
            defined_on: self.originals.keys().copied().collect(),
            installed_on: self.installed.iter().copied().collect(),
            state: self.state(),
        }
    }
}

/// Serializable view of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSnapshot {
    /// Record identity
    pub id: RecordId,
    /// Operation
    pub op: OpName,
    /// Type owning the registry that holds the record
    pub owner: TypeKey,
    /// Owner's name
    pub owner_name: String,
    /// Before-advice labels in run order
    pub before: Vec<String>,
    /// After-advice labels in run order
    pub after: Vec<String>,
    /// Arity of the first captured implementation
    pub original_arity: usize,
    /// Types whose own implementation is captured, oldest first
    pub defined_on: Vec<TypeKey>,
    /// Types carrying an effective operation built from the record
    pub installed_on: Vec<TypeKey>,
    /// Advice state
    pub state: AdviceState,
}
