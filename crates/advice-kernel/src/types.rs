//! Type table
//!
//! Declared types, their parents and their method tables. Method
//! resolution walks the parent chain, most-derived first.

use advice_composition::{AdviceError, DefinitionFlag, Method};
use advice_symbol::{OpName, TypeKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Observer notified when a type (re)defines an operation
pub type DefinitionObserver = Arc<dyn Fn(&DefinitionEvent) + Send + Sync>;

/// A (re)definition of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionEvent {
    /// Type that defined the operation
    pub ty: TypeKey,
    /// Its name
    pub type_name: String,
    /// Operation defined
    pub op: OpName,
}

/// One declared type
pub struct TypeEntry {
    key: TypeKey,
    name: String,
    parent: Option<TypeKey>,
    methods: HashMap<OpName, Method>,
    advice_enabled: bool,
    flag: DefinitionFlag,
    observers: Vec<DefinitionObserver>,
}

impl TypeEntry {
    fn new(key: TypeKey, name: String, parent: Option<TypeKey>) -> Self {
        Self {
            key,
            name,
            parent,
            methods: HashMap::new(),
            advice_enabled: false,
            flag: DefinitionFlag::new(),
            observers: Vec::new(),
        }
    }

    /// Key of this type
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Name of this type
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct parent
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<TypeKey> {
        self.parent
    }

    /// Method defined directly on this type
    #[inline]
    #[must_use]
    pub fn own_method(&self, op: &OpName) -> Option<&Method> {
        self.methods.get(op)
    }

    /// Operations defined directly on this type
    pub fn own_ops(&self) -> impl Iterator<Item = &OpName> {
        self.methods.keys()
    }

    /// Check if advice was enabled on this type itself
    #[inline]
    #[must_use]
    pub fn advice_enabled(&self) -> bool {
        self.advice_enabled
    }

    pub(crate) fn flag(&self) -> &DefinitionFlag {
        &self.flag
    }

    pub(crate) fn observers(&self) -> &[DefinitionObserver] {
        &self.observers
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("ops", &self.methods.keys().collect::<Vec<_>>())
            .field("advice_enabled", &self.advice_enabled)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// All declared types of a runtime
#[derive(Debug, Default)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeKey>,
}

impl TypeTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type
    ///
    /// # Errors
    /// Returns [`AdviceError::DuplicateType`] if the name is taken, or
    /// [`AdviceError::UnknownType`] if `parent` is not declared.
    pub fn declare(&mut self, name: &str, parent: Option<TypeKey>) -> Result<TypeKey, AdviceError> {
        if self.by_name.contains_key(name) {
            return Err(AdviceError::DuplicateType(name.to_string()));
        }
        if let Some(parent) = parent {
            self.get(parent)?;
        }

        let index = u32::try_from(self.entries.len())
            .map_err(|_| AdviceError::UnknownType(name.to_string()))?;
        let key = TypeKey::new(index);
        self.entries.push(TypeEntry::new(key, name.to_string(), parent));
        self.by_name.insert(name.to_string(), key);
        Ok(key)
    }

    /// Entry for `key`
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] if `key` was not issued here.
    pub fn get(&self, key: TypeKey) -> Result<&TypeEntry, AdviceError> {
        self.entries
            .get(key.as_usize())
            .ok_or_else(|| AdviceError::UnknownType(key.to_string()))
    }

    /// Mutable entry for `key`
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] if `key` was not issued here.
    pub fn get_mut(&mut self, key: TypeKey) -> Result<&mut TypeEntry, AdviceError> {
        self.entries
            .get_mut(key.as_usize())
            .ok_or_else(|| AdviceError::UnknownType(key.to_string()))
    }

    /// Key for a type name
    #[inline]
    #[must_use]
    pub fn key_of(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Name of `key`, or its display form if unknown
    #[must_use]
    pub fn name_of(&self, key: TypeKey) -> String {
        self.get(key)
            .map_or_else(|_| key.to_string(), |entry| entry.name.clone())
    }

    /// `key` and its ancestors, most-derived first
    #[must_use]
    pub fn ancestors(&self, key: TypeKey) -> Vec<TypeKey> {
        let mut chain = Vec::new();
        let mut current = self.entries.get(key.as_usize());
        while let Some(entry) = current {
            chain.push(entry.key);
            current = entry.parent.and_then(|p| self.entries.get(p.as_usize()));
        }
        chain
    }

    /// Check if `key` or an ancestor enabled advice
    #[must_use]
    pub fn is_advised(&self, key: TypeKey) -> bool {
        self.ancestors(key)
            .into_iter()
            .any(|k| self.entries[k.as_usize()].advice_enabled)
    }

    /// Installed implementation of `op` as seen from `key`
    #[must_use]
    pub fn resolve(&self, key: TypeKey, op: &OpName) -> Option<Method> {
        self.ancestors(key)
            .into_iter()
            .find_map(|k| self.entries[k.as_usize()].methods.get(op).cloned())
    }

    /// Observers of `key` and its ancestors, nearest first
    #[must_use]
    pub fn observers_for(&self, key: TypeKey) -> Vec<DefinitionObserver> {
        self.ancestors(key)
            .into_iter()
            .flat_map(|k| self.entries[k.as_usize()].observers().iter().cloned())
            .collect()
    }

    pub(crate) fn install(&mut self, key: TypeKey, op: OpName, method: Method) -> Result<Option<Method>, AdviceError> {
        Ok(self.get_mut(key)?.methods.insert(op, method))
    }

    pub(crate) fn enable_advice(&mut self, key: TypeKey) -> Result<bool, AdviceError> {
        let entry = self.get_mut(key)?;
        let was = entry.advice_enabled;
        entry.advice_enabled = true;
        Ok(!was)
    }

    pub(crate) fn add_observer(&mut self, key: TypeKey, observer: DefinitionObserver) -> Result<(), AdviceError> {
        self.get_mut(key)?.observers.push(observer);
        Ok(())
    }

    /// Number of declared types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no types are declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter()
    }
}
