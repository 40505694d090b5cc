//! Composition registries
//!
//! Provides [`CompositionRegistry`] (records of one owner type) and
//! [`Registries`] (all owners of a host, plus the cached owner pointers
//! subtypes resolve to).

use crate::record::CompositionRecord;
use advice_symbol::{OpName, TypeKey};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Records owned by one type, keyed by operation
#[derive(Debug, Default, Clone)]
pub struct CompositionRegistry {
    records: IndexMap<OpName, CompositionRecord>,
}

impl CompositionRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }

    /// Record for `op`
    #[inline]
    #[must_use]
    pub fn get(&self, op: &OpName) -> Option<&CompositionRecord> {
        self.records.get(op)
    }

    /// Mutable record for `op`
    #[inline]
    pub fn get_mut(&mut self, op: &OpName) -> Option<&mut CompositionRecord> {
        self.records.get_mut(op)
    }

    /// Check if a record exists
    #[inline]
    #[must_use]
    pub fn contains(&self, op: &OpName) -> bool {
        self.records.contains_key(op)
    }

    /// Insert record, keyed by its operation
    ///
    /// Returns the record it replaced, if any.
    pub fn insert(&mut self, record: CompositionRecord) -> Option<CompositionRecord> {
        self.records.insert(record.op().clone(), record)
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Operations in first-reference order
    pub fn ops(&self) -> impl Iterator<Item = &OpName> {
        self.records.keys()
    }

    /// Iterate over records in first-reference order
    pub fn iter(&self) -> impl Iterator<Item = &CompositionRecord> {
        self.records.values()
    }
}

/// All registries of one host
///
/// A type resolves its owner once: the nearest type in its ancestor chain
/// (itself first) that owns a registry, or itself if none does. The answer
/// is cached until [`Registries::detach`] changes ownership.
#[derive(Debug, Default)]
pub struct Registries {
    by_owner: HashMap<TypeKey, CompositionRegistry>,
    owner_cache: HashMap<TypeKey, TypeKey>,
}

impl Registries {
    /// Create without owners
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner for `ty`, creating a registry on `ty` if no ancestor owns one
    ///
    /// `ancestors` lists `ty` and its ancestors, most-derived first.
    pub fn resolve_owner(&mut self, ty: TypeKey, ancestors: &[TypeKey]) -> TypeKey {
        if let Some(owner) = self.owner_cache.get(&ty) {
            return *owner;
        }

        let owner = match self.find_owner(ancestors) {
            Some(owner) => owner,
            None => {
                tracing::debug!(owner = %ty, "creating composition registry");
                self.by_owner.insert(ty, CompositionRegistry::new());
                ty
            }
        };

        self.owner_cache.insert(ty, owner);
        owner
    }

    /// Nearest owner in `ancestors`, without creating or caching anything
    #[must_use]
    pub fn find_owner(&self, ancestors: &[TypeKey]) -> Option<TypeKey> {
        ancestors
            .iter()
            .copied()
            .find(|candidate| self.by_owner.contains_key(candidate))
    }

    /// Registry owned by `owner`
    #[inline]
    #[must_use]
    pub fn registry(&self, owner: TypeKey) -> Option<&CompositionRegistry> {
        self.by_owner.get(&owner)
    }

    /// Registry owned by `owner`, created if missing
    #[inline]
    pub fn registry_mut(&mut self, owner: TypeKey) -> &mut CompositionRegistry {
        self.by_owner.entry(owner).or_default()
    }

    /// Give `ty` a fresh registry of its own
    ///
    /// Any registry `ty` already owned is discarded. Cached owner pointers
    /// are dropped so descendants re-resolve.
    pub fn detach(&mut self, ty: TypeKey) -> Option<CompositionRegistry> {
        self.owner_cache.clear();
        self.by_owner.insert(ty, CompositionRegistry::new())
    }

    /// Check if `ty` owns a registry
    #[inline]
    #[must_use]
    pub fn is_owner(&self, ty: TypeKey) -> bool {
        self.by_owner.contains_key(&ty)
    }

    /// Number of owning types
    #[inline]
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.by_owner.len()
    }

    /// Owning types and their registries
    pub fn iter(&self) -> impl Iterator<Item = (TypeKey, &CompositionRegistry)> {
        self.by_owner.iter().map(|(k, v)| (*k, v))
    }
}
