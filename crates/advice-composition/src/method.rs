//! Methods, receivers and instances
//!
//! A [`Method`] is the unit stored in a host's method table: a fixed arity
//! and a shared body. Both raw implementations and the effective operations
//! synthesized by [`crate::rebuild`] are methods.

use crate::error::AdviceError;
use advice_symbol::{OpName, TypeKey};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Signature shared by every method body
pub type MethodBody = dyn Fn(&Receiver<'_>, Vec<Value>) -> Result<Value, AdviceError> + Send + Sync;

/// Arity class of a method or interceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArityClass {
    /// Takes no explicit arguments
    Zero,

    /// Takes one or more arguments
    NAry,
}

impl ArityClass {
    /// Classify a declared arity
    #[inline]
    #[must_use]
    pub fn of(arity: usize) -> Self {
        if arity == 0 {
            Self::Zero
        } else {
            Self::NAry
        }
    }
}

/// How a method entered the method table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Defined by user code
    Raw,

    /// Synthesized from a composition record
    Effective,
}

/// Callable operation implementation
///
/// Cloning a method clones the reference to its body, so a captured method
/// keeps its behavior after the operation is redefined elsewhere.
#[derive(Clone)]
pub struct Method {
    arity: usize,
    kind: MethodKind,
    body: Arc<MethodBody>,
}

impl Method {
    /// Create raw method with declared arity
    ///
    /// # Example
    /// ```
    /// use advice_composition::Method;
    /// use serde_json::json;
    ///
    /// let one = Method::new(1, |_rx, args| Ok(json!(args[0].as_i64().unwrap_or(0) + 1)));
    /// assert_eq!(one.arity(), 1);
    /// ```
    #[must_use]
    pub fn new<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&Receiver<'_>, Vec<Value>) -> Result<Value, AdviceError> + Send + Sync + 'static,
    {
        Self {
            arity,
            kind: MethodKind::Raw,
            body: Arc::new(body),
        }
    }

    pub(crate) fn effective<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&Receiver<'_>, Vec<Value>) -> Result<Value, AdviceError> + Send + Sync + 'static,
    {
        Self {
            arity,
            kind: MethodKind::Effective,
            body: Arc::new(body),
        }
    }

    /// Declared arity
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Arity class
    #[inline]
    #[must_use]
    pub fn arity_class(&self) -> ArityClass {
        ArityClass::of(self.arity)
    }

    /// Origin of this method
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Check if both handles share one body
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    /// Call the method
    ///
    /// # Errors
    /// Returns [`AdviceError::ArityMismatch`] if `args.len()` differs from the
    /// declared arity; otherwise whatever the body returns.
    pub fn call(&self, rx: &Receiver<'_>, args: Vec<Value>) -> Result<Value, AdviceError> {
        if args.len() != self.arity {
            return Err(AdviceError::ArityMismatch {
                op: rx.op().clone(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.body)(rx, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("arity", &self.arity)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Object that operations are invoked on
#[derive(Debug)]
pub struct Instance {
    ty: TypeKey,
    slots: Mutex<Map<String, Value>>,
}

impl Instance {
    /// Create instance of `ty` with no slots
    #[inline]
    #[must_use]
    pub fn new(ty: TypeKey) -> Self {
        Self {
            ty,
            slots: Mutex::new(Map::new()),
        }
    }

    /// Type of this instance
    #[inline]
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.ty
    }

    /// Read a slot
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<Value> {
        self.slots.lock().get(slot).cloned()
    }

    /// Write a slot, returning the previous value
    pub fn set(&self, slot: impl Into<String>, value: Value) -> Option<Value> {
        self.slots.lock().insert(slot.into(), value)
    }

    /// Copy of all slots
    #[must_use]
    pub fn slots(&self) -> Map<String, Value> {
        self.slots.lock().clone()
    }
}

/// Sends operations to instances
///
/// Implemented by the host so bodies can call other operations on their
/// receiver.
pub trait Dispatch: Send + Sync {
    /// Invoke `op` on `instance`
    ///
    /// # Errors
    /// Returns error if the operation is undefined or the call fails.
    fn dispatch(&self, instance: &Instance, op: &OpName, args: Vec<Value>) -> Result<Value, AdviceError>;
}

/// The `self` of a running method or interceptor
#[derive(Clone, Copy)]
pub struct Receiver<'a> {
    instance: &'a Instance,
    op: &'a OpName,
    dispatch: &'a dyn Dispatch,
}

impl<'a> Receiver<'a> {
    /// Bind an instance for a call to `op`
    #[inline]
    #[must_use]
    pub fn new(instance: &'a Instance, op: &'a OpName, dispatch: &'a dyn Dispatch) -> Self {
        Self {
            instance,
            op,
            dispatch,
        }
    }

    /// Instance being invoked
    #[inline]
    #[must_use]
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Operation being invoked
    #[inline]
    #[must_use]
    pub fn op(&self) -> &'a OpName {
        self.op
    }

    /// Read a slot on the instance
    #[inline]
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<Value> {
        self.instance.get(slot)
    }

    /// Write a slot on the instance
    #[inline]
    pub fn set(&self, slot: impl Into<String>, value: Value) -> Option<Value> {
        self.instance.set(slot, value)
    }

    /// Invoke another operation on the same instance
    ///
    /// # Errors
    /// Returns error if the name is invalid or the dispatched call fails.
    pub fn send(&self, op: &str, args: Vec<Value>) -> Result<Value, AdviceError> {
        let op = OpName::parse(op)?;
        self.dispatch.dispatch(self.instance, &op, args)
    }
}

impl fmt::Debug for Receiver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("instance", &self.instance)
            .field("op", &self.op)
            .finish_non_exhaustive()
    }
}
