//! Host type system boundary
//!
//! The engine never owns types or method tables. It drives a host through
//! [`AdviceHost`], and the host calls back into [`crate::hook::method_added`]
//! whenever an advice-enabled type (re)defines an operation.

use crate::error::AdviceError;
use crate::method::Method;
use crate::registry::Registries;
use advice_symbol::{OpName, TypeKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Primitives the engine needs from a type system
pub trait AdviceHost {
    /// `ty` followed by its ancestors, most-derived first
    fn ancestors(&self, ty: TypeKey) -> Vec<TypeKey>;

    /// Display name of `ty`
    fn type_name(&self, ty: TypeKey) -> String;

    /// Currently installed implementation of `op` as seen from `ty`
    ///
    /// Resolves through ancestors. The returned handle must not change when
    /// `op` is later redefined.
    fn instance_method(&self, ty: TypeKey, op: &OpName) -> Option<Method>;

    /// Check if `ty` has its own entry for `op`, ignoring ancestors
    fn defines(&self, ty: TypeKey, op: &OpName) -> bool;

    /// Install `method` as `ty`'s implementation of `op`
    ///
    /// Must notify [`crate::hook::method_added`] synchronously when advice is
    /// enabled on `ty`, exactly as a user definition would.
    ///
    /// # Errors
    /// Propagates failures of the definition hook.
    fn install_method(&mut self, ty: TypeKey, op: &OpName, method: Method) -> Result<(), AdviceError>;

    /// Reentrancy flag of `ty`
    fn definition_flag(&self, ty: TypeKey) -> DefinitionFlag;

    /// Registry storage
    fn registries(&self) -> &Registries;

    /// Mutable registry storage
    fn registries_mut(&mut self) -> &mut Registries;

    /// Pass a definition event on to observers registered before advice
    fn forward_definition(&mut self, ty: TypeKey, op: &OpName);
}

/// Per-type "definition in progress" flag
#[derive(Debug, Clone, Default)]
pub struct DefinitionFlag(Arc<AtomicBool>);

impl DefinitionFlag {
    /// Create cleared flag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a guarded region is active
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the flag until the returned guard drops
    ///
    /// Dropping the guard restores the value seen on entry, so nested
    /// acquisitions unwind correctly.
    #[must_use = "the flag is released when the guard drops"]
    pub fn acquire(&self) -> DefinitionGuard {
        let was = self.0.swap(true, Ordering::AcqRel);
        DefinitionGuard {
            flag: Arc::clone(&self.0),
            was,
        }
    }
}

/// Scoped hold on a [`DefinitionFlag`]
#[derive(Debug)]
pub struct DefinitionGuard {
    flag: Arc<AtomicBool>,
    was: bool,
}

impl Drop for DefinitionGuard {
    fn drop(&mut self) {
        self.flag.store(self.was, Ordering::Release);
    }
}
