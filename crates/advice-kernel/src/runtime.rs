//! Runtime
//!
//! [`Runtime`] owns a [`TypeTable`] and the composition registries and
//! exposes the public advice surface. All mutation is serialized behind
//! one lock; the lock is released before any method body runs, so bodies
//! may call back into the runtime through their receiver.
//!
//! Definition observers run while the lock is held. They receive only the
//! event and must not call back into the runtime.

use crate::config::RuntimeConfig;
use crate::types::{DefinitionEvent, TypeTable};
use advice_composition::{
    advice, hook, Advice, AdviceError, AdviceHost, AdviceState, DefinitionFlag, Dispatch, Instance, Method,
    Receiver, RecordSnapshot, Registries,
};
use advice_symbol::{OpName, TypeKey};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Host type system with before/after advice
pub struct Runtime {
    config: RuntimeConfig,
    state: Mutex<RuntimeState>,
}

struct RuntimeState {
    forward_observers: bool,
    types: TypeTable,
    registries: Registries,
}

impl RuntimeState {
    fn notify(&self, ty: TypeKey, op: &OpName) {
        let observers = self.types.observers_for(ty);
        if observers.is_empty() {
            return;
        }
        let event = DefinitionEvent {
            ty,
            type_name: self.types.name_of(ty),
            op: op.clone(),
        };
        for observer in observers {
            observer(&event);
        }
    }

    /// Validate the target of a `before`/`after`/`reset` call and enable
    /// advice on it
    ///
    /// The first name must resolve before advice is switched on, so a call
    /// that fails outright leaves the type untouched.
    fn prepare(&mut self, ty: TypeKey, ops: &[OpName], auto_enable: bool) -> Result<(), AdviceError> {
        self.types.get(ty)?;
        let Some(first) = ops.first() else {
            return Ok(());
        };
        if self.types.resolve(ty, first).is_none() {
            return Err(AdviceError::Lookup {
                type_name: self.types.name_of(ty),
                op: first.clone(),
            });
        }
        self.ensure_advice(ty, auto_enable)
    }

    fn ensure_advice(&mut self, ty: TypeKey, auto_enable: bool) -> Result<(), AdviceError> {
        if self.types.is_advised(ty) {
            return Ok(());
        }
        if !auto_enable {
            return Err(AdviceError::AdviceNotEnabled(self.types.name_of(ty)));
        }
        self.types.enable_advice(ty)?;
        tracing::debug!(ty = %ty, name = %self.types.name_of(ty), "advice enabled implicitly");
        Ok(())
    }
}

impl AdviceHost for RuntimeState {
    fn ancestors(&self, ty: TypeKey) -> Vec<TypeKey> {
        self.types.ancestors(ty)
    }

    fn type_name(&self, ty: TypeKey) -> String {
        self.types.name_of(ty)
    }

    fn instance_method(&self, ty: TypeKey, op: &OpName) -> Option<Method> {
        self.types.resolve(ty, op)
    }

    fn defines(&self, ty: TypeKey, op: &OpName) -> bool {
        self.types
            .get(ty)
            .is_ok_and(|entry| entry.own_method(op).is_some())
    }

    fn install_method(&mut self, ty: TypeKey, op: &OpName, method: Method) -> Result<(), AdviceError> {
        self.types.install(ty, op.clone(), method)?;
        if self.types.is_advised(ty) {
            hook::method_added(self, ty, op)
        } else {
            self.notify(ty, op);
            Ok(())
        }
    }

    fn definition_flag(&self, ty: TypeKey) -> DefinitionFlag {
        self.types
            .get(ty)
            .map_or_else(|_| DefinitionFlag::new(), |entry| entry.flag().clone())
    }

    fn registries(&self) -> &Registries {
        &self.registries
    }

    fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    fn forward_definition(&mut self, ty: TypeKey, op: &OpName) {
        if self.forward_observers {
            self.notify(ty, op);
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    /// Create an empty runtime
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        let state = RuntimeState {
            forward_observers: config.forward_definition_observers,
            types: TypeTable::new(),
            registries: Registries::new(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Configuration in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Declare a type, optionally deriving from `parent`
    ///
    /// # Errors
    /// Returns [`AdviceError::DuplicateType`] or [`AdviceError::UnknownType`].
    pub fn define_type(&self, name: &str, parent: Option<TypeKey>) -> Result<TypeKey, AdviceError> {
        let key = self.state.lock().types.declare(name, parent)?;
        tracing::debug!(ty = %key, name, parent = ?parent, "type declared");
        Ok(key)
    }

    /// Key of a declared type
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] if no type has that name.
    pub fn type_key(&self, name: &str) -> Result<TypeKey, AdviceError> {
        self.state
            .lock()
            .types
            .key_of(name)
            .ok_or_else(|| AdviceError::UnknownType(name.to_string()))
    }

    /// Name of a declared type
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] for a foreign key.
    pub fn type_name(&self, ty: TypeKey) -> Result<String, AdviceError> {
        Ok(self.state.lock().types.get(ty)?.name().to_string())
    }

    /// Names of all declared types in declaration order
    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        self.state.lock().types.iter().map(|e| e.name().to_string()).collect()
    }

    /// Make `ty` and types derived from it participate in advice
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] for a foreign key.
    pub fn enable_advice(&self, ty: TypeKey) -> Result<(), AdviceError> {
        if self.state.lock().types.enable_advice(ty)? {
            tracing::debug!(ty = %ty, "advice enabled");
        }
        Ok(())
    }

    /// Check if `ty` or an ancestor has advice enabled
    #[must_use]
    pub fn is_advice_enabled(&self, ty: TypeKey) -> bool {
        self.state.lock().types.is_advised(ty)
    }

    /// Define or redefine `name` on `ty`
    ///
    /// On an advice-enabled type the new body becomes the wrapped
    /// implementation and the current advice is re-applied around it.
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`], an invalid-name error, or an
    /// error from re-applying advice.
    pub fn define_method(&self, ty: TypeKey, name: &str, method: Method) -> Result<(), AdviceError> {
        let op = OpName::parse(name)?;
        let mut state = self.state.lock();
        state.types.get(ty)?;
        state.install_method(ty, &op, method).map_err(|err| {
            tracing::warn!(ty = %ty, op = %op, error = %err, "definition handling failed");
            err
        })
    }

    /// Register an observer for definitions on `ty` and derived types
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] for a foreign key.
    pub fn on_define<F>(&self, ty: TypeKey, observer: F) -> Result<(), AdviceError>
    where
        F: Fn(&DefinitionEvent) + Send + Sync + 'static,
    {
        self.state.lock().types.add_observer(ty, Arc::new(observer))
    }

    /// Prepend `advice` to each named operation's before-chain
    ///
    /// # Errors
    /// Returns [`AdviceError::Lookup`] for the first name `ty` cannot
    /// resolve; earlier names stay advised.
    pub fn before(&self, ty: TypeKey, names: &[&str], advice: impl Into<Advice>) -> Result<(), AdviceError> {
        let ops = parse_names(names)?;
        let mut state = self.state.lock();
        state.prepare(ty, &ops, self.config.auto_enable_advice)?;
        advice::add_before(&mut *state, ty, &ops, &advice.into())
    }

    /// Append `advice` to each named operation's after-chain
    ///
    /// # Errors
    /// Returns [`AdviceError::Lookup`] for the first name `ty` cannot
    /// resolve; earlier names stay advised.
    pub fn after(&self, ty: TypeKey, names: &[&str], advice: impl Into<Advice>) -> Result<(), AdviceError> {
        let ops = parse_names(names)?;
        let mut state = self.state.lock();
        state.prepare(ty, &ops, self.config.auto_enable_advice)?;
        advice::add_after(&mut *state, ty, &ops, &advice.into())
    }

    /// Drop all advice on the named operations
    ///
    /// # Errors
    /// Returns [`AdviceError::Lookup`] for a name `ty` cannot resolve.
    pub fn reset(&self, ty: TypeKey, names: &[&str]) -> Result<(), AdviceError> {
        let ops = parse_names(names)?;
        let mut state = self.state.lock();
        state.prepare(ty, &ops, self.config.auto_enable_advice)?;
        advice::reset(&mut *state, ty, &ops)
    }

    /// New instance of `ty`
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] for a foreign key.
    pub fn instantiate(&self, ty: TypeKey) -> Result<Instance, AdviceError> {
        self.state.lock().types.get(ty)?;
        Ok(Instance::new(ty))
    }

    /// Run `name` on `instance`
    ///
    /// # Errors
    /// Returns [`AdviceError::NoMethod`] if the name is undefined,
    /// [`AdviceError::ArityMismatch`] for a wrong argument count, or any
    /// error raised by a body or interceptor.
    pub fn invoke(&self, instance: &Instance, name: &str, args: Vec<Value>) -> Result<Value, AdviceError> {
        let op = OpName::parse(name)?;
        self.dispatch(instance, &op, args)
    }

    /// Installed implementation of `name` as seen from `ty`
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] or an invalid-name error.
    pub fn resolve_method(&self, ty: TypeKey, name: &str) -> Result<Option<Method>, AdviceError> {
        let op = OpName::parse(name)?;
        let state = self.state.lock();
        state.types.get(ty)?;
        Ok(state.types.resolve(ty, &op))
    }

    /// Summary of the record `ty` resolves for `name`
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] or an invalid-name error.
    pub fn snapshot(&self, ty: TypeKey, name: &str) -> Result<Option<RecordSnapshot>, AdviceError> {
        let op = OpName::parse(name)?;
        let state = self.state.lock();
        state.types.get(ty)?;
        Ok(advice::snapshot(&*state, ty, &op))
    }

    /// Summaries of every record, ordered by owner then operation
    #[must_use]
    pub fn snapshots(&self) -> Vec<RecordSnapshot> {
        let state = self.state.lock();
        let mut all: Vec<_> = state
            .registries
            .iter()
            .flat_map(|(owner, registry)| {
                let owner_name = state.types.name_of(owner);
                registry
                    .iter()
                    .map(move |record| record.snapshot(owner, &owner_name))
                    .collect::<Vec<_>>()
            })
            .collect();
        all.sort_by(|a, b| (a.owner, &a.op).cmp(&(b.owner, &b.op)));
        all
    }

    /// Advice state of `name` as seen from `ty`
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] or an invalid-name error.
    pub fn advice_state(&self, ty: TypeKey, name: &str) -> Result<AdviceState, AdviceError> {
        let op = OpName::parse(name)?;
        let state = self.state.lock();
        state.types.get(ty)?;
        Ok(advice::advice_state(&*state, ty, &op))
    }

    /// Give `ty` a fresh, empty registry of its own
    ///
    /// Installed operations are untouched. Advice added afterwards wraps
    /// whatever `ty` resolves at that point.
    ///
    /// # Errors
    /// Returns [`AdviceError::UnknownType`] for a foreign key.
    pub fn detach_registry(&self, ty: TypeKey) -> Result<(), AdviceError> {
        let mut state = self.state.lock();
        state.types.get(ty)?;
        let previous = state.registries.detach(ty);
        tracing::debug!(ty = %ty, dropped = previous.map_or(0, |r| r.len()), "registry detached");
        Ok(())
    }
}

impl Dispatch for Runtime {
    fn dispatch(&self, instance: &Instance, op: &OpName, args: Vec<Value>) -> Result<Value, AdviceError> {
        let ty = instance.type_key();
        let method = {
            let state = self.state.lock();
            state.types.resolve(ty, op).ok_or_else(|| AdviceError::NoMethod {
                type_name: state.types.name_of(ty),
                op: op.clone(),
            })?
        };

        if self.config.trace_invocations {
            tracing::trace!(ty = %ty, op = %op, args = args.len(), kind = ?method.kind(), "invoke");
        }
        let rx = Receiver::new(instance, op, self);
        method.call(&rx, args)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("types", &state.types.len())
            .field("registries", &state.registries.owner_count())
            .finish()
    }
}

fn parse_names(names: &[&str]) -> Result<Vec<OpName>, AdviceError> {
    names
        .iter()
        .map(|name| OpName::parse(name).map_err(AdviceError::from))
        .collect()
}
