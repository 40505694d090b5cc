//! Interceptors and labelled advice
//!
//! An [`Interceptor`] is tagged with its arity class when it is created.
//! The rebuild engine branches on the tag; nothing is introspected at call
//! time.

use crate::error::AdviceError;
use crate::method::{ArityClass, Receiver};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Side-effect-only interceptor body
pub type ZeroArgFn = dyn Fn(&Receiver<'_>) -> Result<(), AdviceError> + Send + Sync;

/// Transforming interceptor body
pub type NAryFn = dyn Fn(&Receiver<'_>, Vec<Value>) -> Result<Value, AdviceError> + Send + Sync;

/// Before or after interceptor
#[derive(Clone)]
pub enum Interceptor {
    /// Runs for side effects; values flow past it unchanged
    ZeroArg(Arc<ZeroArgFn>),

    /// Receives the flowing values and returns their replacement
    NAry(Arc<NAryFn>),
}

impl Interceptor {
    /// Create side-effect-only interceptor
    #[must_use]
    pub fn zero<F>(f: F) -> Self
    where
        F: Fn(&Receiver<'_>) -> Result<(), AdviceError> + Send + Sync + 'static,
    {
        Self::ZeroArg(Arc::new(f))
    }

    /// Create transforming interceptor
    ///
    /// As before-advice it receives the argument list and returns the new
    /// one (see [`expand`]). As after-advice it receives `[result]` and
    /// returns the new result.
    #[must_use]
    pub fn nary<F>(f: F) -> Self
    where
        F: Fn(&Receiver<'_>, Vec<Value>) -> Result<Value, AdviceError> + Send + Sync + 'static,
    {
        Self::NAry(Arc::new(f))
    }

    /// Arity class fixed at creation
    #[inline]
    #[must_use]
    pub fn arity_class(&self) -> ArityClass {
        match self {
            Self::ZeroArg(_) => ArityClass::Zero,
            Self::NAry(_) => ArityClass::NAry,
        }
    }

    /// Attach a label for introspection
    #[inline]
    #[must_use]
    pub fn labelled(self, label: impl Into<String>) -> Advice {
        Advice {
            label: Some(Arc::from(label.into())),
            interceptor: self,
        }
    }

    /// Run as before-advice of an n-ary operation
    pub(crate) fn filter_args(&self, rx: &Receiver<'_>, args: Vec<Value>) -> Result<Vec<Value>, AdviceError> {
        match self {
            Self::ZeroArg(f) => {
                f(rx)?;
                Ok(args)
            }
            Self::NAry(f) => Ok(expand(f(rx, args)?)),
        }
    }

    /// Run as after-advice
    pub(crate) fn filter_result(&self, rx: &Receiver<'_>, result: Value) -> Result<Value, AdviceError> {
        match self {
            Self::ZeroArg(f) => {
                f(rx)?;
                Ok(result)
            }
            Self::NAry(f) => f(rx, vec![result]),
        }
    }

    /// Run for side effects only, discarding any return value
    pub(crate) fn run_for_effect(&self, rx: &Receiver<'_>) -> Result<(), AdviceError> {
        match self {
            Self::ZeroArg(f) => f(rx),
            Self::NAry(f) => f(rx, Vec::new()).map(|_| ()),
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroArg(_) => f.write_str("Interceptor::ZeroArg"),
            Self::NAry(_) => f.write_str("Interceptor::NAry"),
        }
    }
}

/// Expand an interceptor's return value into positional arguments
///
/// Arrays spread into their elements, `null` into no arguments, anything
/// else into a single argument. A single array argument must therefore be
/// returned wrapped: `[[1, 2]]`.
#[must_use]
pub fn expand(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Interceptor as registered in a chain
#[derive(Debug, Clone)]
pub struct Advice {
    label: Option<Arc<str>>,
    interceptor: Interceptor,
}

impl Advice {
    /// Unlabelled advice
    #[inline]
    #[must_use]
    pub fn new(interceptor: Interceptor) -> Self {
        Self {
            label: None,
            interceptor,
        }
    }

    /// Label given at registration
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Wrapped interceptor
    #[inline]
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }
}

impl From<Interceptor> for Advice {
    fn from(interceptor: Interceptor) -> Self {
        Self::new(interceptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Instance;
    use crate::testing::NullDispatch;
    use advice_symbol::{OpName, TypeKey};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn with_rx<T>(f: impl FnOnce(&Receiver<'_>) -> T) -> T {
        let instance = Instance::new(TypeKey::new(0));
        let op = OpName::new("op");
        let rx = Receiver::new(&instance, &op, &NullDispatch);
        f(&rx)
    }

    #[test]
    fn expand_rules() {
        assert_eq!(expand(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(expand(json!(null)), Vec::<Value>::new());
        assert_eq!(expand(json!(5)), vec![json!(5)]);
        assert_eq!(expand(json!([[1, 2]])), vec![json!([1, 2])]);
        assert_eq!(expand(json!({"a": 1})), vec![json!({"a": 1})]);
    }

    #[test]
    fn arity_class_tags() {
        assert_eq!(Interceptor::zero(|_| Ok(())).arity_class(), ArityClass::Zero);
        assert_eq!(
            Interceptor::nary(|_, _| Ok(Value::Null)).arity_class(),
            ArityClass::NAry
        );
    }

    #[test]
    fn zero_arg_passes_values_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let zero = Interceptor::zero(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        with_rx(|rx| {
            assert_eq!(zero.filter_args(rx, vec![json!(1)]).unwrap(), vec![json!(1)]);
            assert_eq!(zero.filter_result(rx, json!(9)).unwrap(), json!(9));
        });
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn nary_replaces_values() {
        let double = Interceptor::nary(|_, args| Ok(json!(args[0].as_i64().unwrap_or(0) * 2)));

        with_rx(|rx| {
            assert_eq!(double.filter_args(rx, vec![json!(5)]).unwrap(), vec![json!(10)]);
            assert_eq!(double.filter_result(rx, json!(7)).unwrap(), json!(14));
        });
    }

    #[test]
    fn run_for_effect_discards_result() {
        let nary = Interceptor::nary(|_, args| {
            assert!(args.is_empty());
            Ok(json!("ignored"))
        });
        with_rx(|rx| assert!(nary.run_for_effect(rx).is_ok()));
    }

    #[test]
    fn errors_propagate() {
        let failing = Interceptor::zero(|_| Err(AdviceError::raised("boom")));
        with_rx(|rx| {
            assert_eq!(
                failing.filter_result(rx, json!(1)).unwrap_err(),
                AdviceError::raised("boom")
            );
        });
    }

    #[test]
    fn advice_labels() {
        let plain: Advice = Interceptor::zero(|_| Ok(())).into();
        assert!(plain.label().is_none());

        let named = Interceptor::zero(|_| Ok(())).labelled("audit");
        assert_eq!(named.label(), Some("audit"));
        assert_eq!(named.interceptor().arity_class(), ArityClass::Zero);
    }
}
